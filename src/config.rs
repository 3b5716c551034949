//! Configuration management for the cloud storage server
//!
//! Values are layered: built-in defaults, then an optional `config.toml`,
//! then `CLOUD_STORAGE_*` environment variables.

use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "config";
const ENV_PREFIX: &str = "CLOUD_STORAGE";

/// Server configuration, loaded once at startup.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// IP address the HTTP listener binds to
    pub bind_address: String,

    /// Port for the HTTP listener
    pub port: u16,

    /// Root directory for all stored files
    pub storage_root: String,

    /// Maximum upload size in MB
    pub max_upload_size_mb: u64,

    /// Timeout applied to each storage operation
    pub io_timeout_secs: u64,
}

impl ServerConfig {
    /// Load configuration from `./config.toml` (if present) with environment overrides.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::from_builder(
            defaults()?
                .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true)),
        )
    }

    /// Load configuration from an explicit file. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        Self::from_builder(defaults()?.add_source(File::from(path)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, config::ConfigError> {
        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.port == 0 {
            return Err(config::ConfigError::Message("port cannot be 0".into()));
        }

        if self.storage_root.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "storage_root cannot be empty".into(),
            ));
        }

        if self.max_upload_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        if self.io_timeout_secs == 0 {
            return Err(config::ConfigError::Message(
                "io_timeout_secs must be greater than 0".into(),
            ));
        }

        self.socket_addr()
            .map_err(|e| config::ConfigError::Message(format!("invalid bind address: {e}")))?;

        Ok(())
    }

    /// Get bind address and port as a socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_address, self.port).parse()
    }

    /// Get storage root as PathBuf
    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Get maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }

    /// Get the storage I/O timeout as Duration
    pub fn io_timeout(&self) -> Duration {
        Duration::from_secs(self.io_timeout_secs)
    }
}

fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
    Config::builder()
        .set_default("bind_address", "127.0.0.1")?
        .set_default("port", 3000_i64)?
        .set_default("storage_root", "./uploads")?
        .set_default("max_upload_size_mb", 100_i64)?
        .set_default("io_timeout_secs", 30_i64)
}
