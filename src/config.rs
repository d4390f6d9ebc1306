//! Server configuration.
//!
//! Defaults suit a local control panel. Applications can embed
//! [`ServerConfig`] in their own serde configuration, or overlay the
//! `HTTP_CONTROL_*` environment variables with [`ServerConfig::from_env`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, Result};
use crate::messages;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_TITLE: &str = "http-control";
pub const DEFAULT_SERVICE_NAME: &str = "http-control";
pub const DEFAULT_SHUTDOWN_GRACE_MS: u64 = 2000;

pub const ENV_HOST: &str = "HTTP_CONTROL_HOST";
pub const ENV_PORT: &str = "HTTP_CONTROL_PORT";
pub const ENV_MESSAGE_CAPACITY: &str = "HTTP_CONTROL_MESSAGE_CAPACITY";
pub const ENV_NO_DISCOVERY: &str = "HTTP_CONTROL_NO_DISCOVERY";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to listen on
    pub host: String,
    /// Port to listen on; 0 lets the OS pick one
    pub port: u16,
    /// Page title shown in the browser
    pub title: String,
    /// Maximum number of operator-visible messages kept
    pub message_capacity: usize,
    /// Warn when the application re-registers an existing name
    pub warn_on_overwrite: bool,
    /// Advertise the server through the discovery collaborator, if any
    pub advertise: bool,
    /// Name used for the discovery record
    pub service_name: String,
    /// How long `stop()` waits for open connections before dropping them
    pub shutdown_grace_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            title: DEFAULT_TITLE.to_string(),
            message_capacity: messages::DEFAULT_CAPACITY,
            warn_on_overwrite: true,
            advertise: true,
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            shutdown_grace_ms: DEFAULT_SHUTDOWN_GRACE_MS,
        }
    }
}

impl ServerConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }

    /// Defaults overlaid with the `HTTP_CONTROL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Overlay settings found through `lookup` onto this config.
    pub fn overlay<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(ENV_HOST).filter(|h| !h.trim().is_empty()) {
            self.host = host.trim().to_string();
        }

        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.trim().parse().map_err(|_| {
                ControlError::InvalidConfig(format!("{} must be a port number, got '{}'", ENV_PORT, port))
            })?;
        }

        if let Some(capacity) = lookup(ENV_MESSAGE_CAPACITY) {
            self.message_capacity = capacity.trim().parse().map_err(|_| {
                ControlError::InvalidConfig(format!(
                    "{} must be a non-negative integer, got '{}'",
                    ENV_MESSAGE_CAPACITY, capacity
                ))
            })?;
        }

        if let Some(flag) = lookup(ENV_NO_DISCOVERY) {
            let flag = flag.trim().to_ascii_lowercase();
            if !matches!(flag.as_str(), "" | "0" | "false" | "no") {
                self.advertise = false;
            }
        }

        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.message_capacity, 255);
        assert!(config.advertise);
        assert_eq!(config.shutdown_grace(), Duration::from_secs(2));
    }

    #[test]
    fn test_overlay_reads_all_variables() {
        let config = ServerConfig::default()
            .overlay(lookup_from(&[
                (ENV_HOST, "0.0.0.0"),
                (ENV_PORT, "9000"),
                (ENV_MESSAGE_CAPACITY, "16"),
                (ENV_NO_DISCOVERY, "1"),
            ]))
            .unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 9000);
        assert_eq!(config.message_capacity, 16);
        assert!(!config.advertise);
    }

    #[test]
    fn test_overlay_no_discovery_false_keeps_advertising() {
        let config = ServerConfig::default()
            .overlay(lookup_from(&[(ENV_NO_DISCOVERY, "false")]))
            .unwrap();
        assert!(config.advertise);
    }

    #[test]
    fn test_overlay_rejects_bad_port() {
        let err = ServerConfig::default()
            .overlay(lookup_from(&[(ENV_PORT, "eighty")]))
            .unwrap_err();
        assert!(matches!(err, ControlError::InvalidConfig(_)));
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn test_overlay_without_variables_is_identity() {
        let config = ServerConfig::default().with_port(0);
        let overlaid = config.clone().overlay(|_| None).unwrap();
        assert_eq!(overlaid, config);
    }

    #[test]
    fn test_deserialize_partial_config_uses_defaults() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"port": 0, "title": "Camera rig"}"#).unwrap();
        assert_eq!(config.port, 0);
        assert_eq!(config.title, "Camera rig");
        assert_eq!(config.host, DEFAULT_HOST);
        assert!(config.warn_on_overwrite);
    }
}
