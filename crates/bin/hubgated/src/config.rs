//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `hubgate.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use hubgate_adapter_oauth::OAuthConfig;
use hubgate_app::gateway::GatewayConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Token introspection endpoint.
    pub oauth: OAuthConfig,
    /// Hub session behaviour.
    pub hub: HubConfig,
}

/// HTTP listener configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to (e.g. `0.0.0.0`).
    pub host: String,
    /// TCP port.
    pub port: u16,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

/// Hub session configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Upper bound on any wait for a hub reply, in seconds.
    pub reply_timeout_secs: u64,
    /// Wait for the hub to answer control commands before confirming.
    pub await_confirmation: bool,
}

impl Config {
    /// Load configuration from `hubgate.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("hubgate.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("HUBGATE_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = std::env::var("HUBGATE_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("HUBGATE_BIND") {
            if let Some((host, port)) = val.rsplit_once(':') {
                self.server.host = host.to_string();
                if let Ok(port) = port.parse() {
                    self.server.port = port;
                }
            }
        }
        if let Ok(val) = std::env::var("HUBGATE_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("HUBGATE_OAUTH_URL") {
            self.oauth.introspection_url = val;
        }
        if let Ok(val) = std::env::var("HUBGATE_OAUTH_CLIENT_ID") {
            self.oauth.client_id = val;
        }
        if let Ok(val) = std::env::var("HUBGATE_OAUTH_CLIENT_SECRET") {
            self.oauth.client_secret = val;
        }
        if let Ok(val) = std::env::var("HUBGATE_REPLY_TIMEOUT_SECS") {
            if let Ok(secs) = val.parse() {
                self.hub.reply_timeout_secs = secs;
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("port must be non-zero".to_string()));
        }
        if self.hub.reply_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "hub reply timeout must be non-zero".to_string(),
            ));
        }
        if self.oauth.introspection_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "introspection url must be set".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the `host:port` bind address.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Gateway settings derived from the `[hub]` section.
    #[must_use]
    pub fn gateway(&self) -> GatewayConfig {
        GatewayConfig {
            reply_timeout: Duration::from_secs(self.hub.reply_timeout_secs),
            await_confirmation: self.hub.await_confirmation,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 12345,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hubgated=info,hubgate=info,tower_http=debug".to_string(),
        }
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: 10,
            await_confirmation: false,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
