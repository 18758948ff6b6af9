/*!
 * Configuration for the Pulsar client and Star
 */

use crate::error::{PulsarError, Result};
use pulsar_connect::ClientConfig;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Connection, storage and logging settings shared by both binaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PulsarConfig {
    /// Star host the client sends to
    #[serde(default = "default_host")]
    pub host: String,

    /// Star port (client target and server listen port)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Address the Star binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Number of bounded reads while waiting for a reply
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Upper bound on each read, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// People file loaded at startup and written by `save`
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for PulsarConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            bind: default_bind(),
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
            store_path: default_store_path(),
            log_level: LogLevel::default(),
            log_file: None,
            verbose: false,
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    #[default]
    Warn,

    /// Info, warnings, and errors
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_host() -> String {
    pulsar_connect::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    pulsar_connect::DEFAULT_PORT
}

fn default_bind() -> String {
    "0.0.0.0".to_string()
}

fn default_retry_attempts() -> u32 {
    pulsar_connect::DEFAULT_ATTEMPTS
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_store_path() -> PathBuf {
    PathBuf::from("people.json")
}

impl PulsarConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: PulsarConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Per-user config file: `<config dir>/pulsar/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("pulsar").join("config.toml"))
    }

    /// Load from `path` if given (it must exist), otherwise from the
    /// per-user file if present, otherwise defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if !path.exists() => Err(PulsarError::ConfigNotFound(path.to_path_buf())),
            Some(path) => Self::from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Client-side view of the connection settings
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            host: self.host.clone(),
            port: self.port,
            attempts: self.retry_attempts,
            retry_delay: self.retry_delay(),
        }
    }

    /// Socket address the Star listens on
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .bind
            .parse()
            .map_err(|e| PulsarError::Config(format!("Invalid bind address '{}': {}", self.bind, e)))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}
