//! Hub configuration
//!
//! Values come from the process environment (a `.env` file is loaded first if
//! present), then CLI flags override whatever was set there.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_OUTBOUND_BUFFER: usize = 256;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubConfig {
    /// Interface to bind
    pub host: String,

    pub port: u16,

    /// Frames queued per subscriber before its writer applies backpressure
    pub outbound_buffer: usize,

    /// `tracing` env-filter directive
    pub log_filter: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl HubConfig {
    /// Load configuration from environment variables
    ///
    /// - `HUB_HOST`, `HUB_PORT`, `HUB_OUTBOUND_BUFFER`
    /// - `RUST_LOG` for the log filter
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = lookup("HUB_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("HUB_PORT") {
            config.port = port
                .parse()
                .with_context(|| format!("HUB_PORT is not a valid port: {port}"))?;
        }
        if let Some(buffer) = lookup("HUB_OUTBOUND_BUFFER") {
            config.outbound_buffer = buffer
                .parse()
                .with_context(|| format!("HUB_OUTBOUND_BUFFER is not a number: {buffer}"))?;
        }
        if let Some(filter) = lookup("RUST_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = HubConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, HubConfig::default());
        assert_eq!(config.bind_addr().unwrap().port(), DEFAULT_PORT);
    }

    #[test]
    fn test_env_overrides() {
        let config = HubConfig::from_lookup(lookup(&[
            ("HUB_HOST", "0.0.0.0"),
            ("HUB_PORT", "9100"),
            ("HUB_OUTBOUND_BUFFER", "32"),
            ("RUST_LOG", "state_hub=debug"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr().unwrap().to_string(), "0.0.0.0:9100");
        assert_eq!(config.outbound_buffer, 32);
        assert_eq!(config.log_filter, "state_hub=debug");
    }

    #[test]
    fn test_rejects_bad_port() {
        let err = HubConfig::from_lookup(lookup(&[("HUB_PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("HUB_PORT"));
    }
}
