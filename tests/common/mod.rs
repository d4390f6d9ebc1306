//! Common utilities for integration tests
//!
//! Servers always listen on 127.0.0.1 with an OS-picked port so tests never
//! collide on a fixed port.

#![allow(dead_code)]

use http_control::{Registry, Server, ServerConfig};
use reqwest::blocking::Client;
use std::time::Duration;

/// Config for a local server on any free port
pub fn local_config() -> ServerConfig {
    ServerConfig::default()
        .with_host("127.0.0.1")
        .with_port(0)
        .with_title("Integration test")
}

/// Start a server over `registry` and return it with its base URL
pub fn start_server(registry: &Registry) -> (Server, String) {
    let mut server = Server::new(local_config()).with_registry(registry.clone());
    let addr = server.start().expect("server should start on a free port");
    (server, format!("http://{}", addr))
}

/// HTTP client that reports redirects instead of following them
pub fn client() -> Client {
    Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(5))
        .build()
        .expect("Failed to build HTTP client")
}

/// Registry holding the two variables used throughout the scenarios
pub fn demo_registry() -> Registry {
    let registry = Registry::new();
    registry.register("running", true);
    registry.register("msg", "hello");
    registry
}
