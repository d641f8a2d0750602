//! Server configuration.
//!
//! Configuration is layered, later sources winning:
//! - Built-in defaults
//! - The first TOML file found in the search path (or the one given on the command line)
//! - Environment variables (`GOLF_PORT`, `GOLF_TRANSPORT__WIRE_FORMAT`, ...)

use anyhow::{Context, Result};
use golf_protocol::{codec::MAX_FRAME_SIZE, WireFormat};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

/// Files searched by [`Config::load`], in order.
const CONFIG_PATHS: [&str; 3] = ["golf.toml", "/etc/golf/golf.toml", "~/.config/golf/golf.toml"];

/// Configuration values that parse but cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Host and port do not form a socket address.
    #[error("Invalid bind address {0}")]
    InvalidBindAddr(String),

    /// WebSocket path must be absolute.
    #[error("WebSocket path must start with '/': {0}")]
    InvalidPath(String),

    /// Message size limit outside the protocol's range.
    #[error("max_message_size must be between 1 and {MAX_FRAME_SIZE}, got {0}")]
    InvalidMessageSize(usize),

    /// Metrics exporter would collide with the main listener.
    #[error("Metrics port {0} is already used by the server")]
    PortConflict(u16),
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Transport configuration.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Game action behaviour.
    #[serde(default)]
    pub game: GameConfig,

    /// Metrics configuration.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Path for the WebSocket endpoint.
    #[serde(default = "default_ws_path")]
    pub websocket_path: String,

    /// Encoding of outbound responses.
    #[serde(default)]
    pub wire_format: WireFormat,

    /// Maximum inbound WebSocket message size in bytes.
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
}

/// Game action configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    /// Send an error response when an action fails or a message is malformed.
    /// When off, failures are only logged.
    #[serde(default)]
    pub report_errors: bool,
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Exporter port.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_true() -> bool {
    true
}

fn default_ws_path() -> String {
    "/ws".to_string()
}

fn default_max_message_size() -> usize {
    64 * 1024 // 64 KB
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            transport: TransportConfig::default(),
            game: GameConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            websocket_path: default_ws_path(),
            wire_format: WireFormat::default(),
            max_message_size: default_max_message_size(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: default_metrics_port(),
        }
    }
}

impl Config {
    /// Load configuration from the search path and the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self> {
        let file = CONFIG_PATHS
            .iter()
            .map(|path| shellexpand::tilde(path).into_owned())
            .find(|path| Path::new(path).exists());

        Self::layered(file.as_deref().map(Path::new), environment())
    }

    /// Load configuration from a specific file, still honouring the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the configuration is invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let expanded = shellexpand::tilde(&path.as_ref().to_string_lossy()).into_owned();
        Self::layered(Some(Path::new(&expanded)), environment())
    }

    fn layered(file: Option<&Path>, env: config::Environment) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let config: Config = builder
            .add_source(env)
            .build()
            .context("Failed to assemble configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Check values that deserialize fine but cannot be served.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if !self.transport.websocket_path.starts_with('/') {
            return Err(ConfigError::InvalidPath(
                self.transport.websocket_path.clone(),
            ));
        }

        let size = self.transport.max_message_size;
        if size == 0 || size > MAX_FRAME_SIZE {
            return Err(ConfigError::InvalidMessageSize(size));
        }

        if self.metrics.enabled && self.metrics.port == self.port {
            return Err(ConfigError::PortConflict(self.metrics.port));
        }

        Ok(())
    }

    /// Get the socket address to bind to.
    ///
    /// # Errors
    ///
    /// Returns an error if host and port do not parse as an address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .map_err(|_| ConfigError::InvalidBindAddr(addr))
    }
}

/// `GOLF_` variables, with `__` separating nested keys.
fn environment() -> config::Environment {
    config::Environment::with_prefix("GOLF")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
