//! Listener and runtime settings shared by the services
//!
//! Values come from environment variables under a per-service prefix, e.g.
//! `AUTH_PORT=3000` or `API_DEBUG=true`.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Server settings for one service
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Development mode: exposes password reset links in responses
    pub debug: bool,
    /// Deployment name reported by the health endpoint
    pub environment: String,
    /// Release reported by the health endpoint
    pub version: String,
    /// Public frontend base URL used to build emailed links
    pub frontend_url: Option<String>,
}

impl ServerConfig {
    /// Load settings from `<PREFIX>_*` environment variables
    pub fn load(prefix: &str, default_port: u16) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", i64::from(default_port))?
            .set_default("debug", false)?
            .set_default("environment", "development")?
            .set_default("version", env!("CARGO_PKG_VERSION"))?
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// Socket address string for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
