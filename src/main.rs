use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use http_control::cli::Cli;
use http_control::logging::{self, ApplicationMode, LoggingConfig};
use http_control::{Server, ServerConfig, Value};

fn main() {
    let cli = Cli::parse();

    let mut log_config = logging::config_from_env(cli.quiet, cli.verbose > 0, cli.json);
    if cli.log_file {
        match logging::log_file_path(ApplicationMode::Demo) {
            Some(path) => {
                log_config = LoggingConfig::for_mode(ApplicationMode::Demo);
                log_config.file_output = Some(path);
            },
            None => eprintln!("Warning: no home directory, logging to stdout"),
        }
    }

    if let Err(e) = logging::init_logging(log_config) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = ServerConfig::from_env().context("Invalid environment configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let mut server = Server::new(config);
    let registry = server.registry().clone();

    // Registered before start so the very first page already shows it.
    registry.register("running", true);
    let addr = server.start().context("Failed to start server")?;
    registry.register("msg", "hello");

    println!("Serving on http://{}/", addr);
    println!("Untick 'running' and submit to stop.");

    let poll = Duration::from_millis(cli.poll_ms);
    let mut last_msg = registry.get("msg");
    loop {
        thread::sleep(poll);
        if !registry.updated() {
            continue;
        }

        let msg = registry.get("msg");
        if msg != last_msg {
            let text = msg.as_ref().map(Value::to_string).unwrap_or_default();
            tracing::info!(msg = %text, "msg changed");
            println!("msg: {}", text);
            last_msg = msg;
        }

        if registry.get("running").and_then(|v| v.as_bool()) == Some(false) {
            break;
        }
    }

    server.stop();
    println!("Stopped");
    Ok(())
}
