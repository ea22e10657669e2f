//! Server configuration for Instasite.
//!
//! Loads configuration from environment variables with sensible defaults.
//! All settings can be overridden via `INSTASITE_*` environment variables.

use std::net::SocketAddr;

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8300;
/// Default location of the file storage backend.
pub const DEFAULT_STORAGE_PATH: &str = "./data/instasite.json";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener to.
    pub bind_addr: SocketAddr,
    /// Storage backend type.
    pub storage_backend: StorageBackendType,
    /// Log level filter (e.g., `info`, `debug`, `warn`).
    pub log_level: String,
}

/// Supported storage backend types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackendType {
    /// In-memory (development only, data lost on restart).
    Memory,
    /// Single JSON document on disk.
    File { path: String },
    /// Redb persistent storage.
    Redb { path: String },
    /// No durable storage. Customizations last for the process lifetime.
    None,
}

/// Invalid configuration value.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown storage backend '{value}' (expected memory, file, redb, or none)")]
    UnknownStorage { value: String },

    #[error("invalid {var} '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            storage_backend: StorageBackendType::File {
                path: DEFAULT_STORAGE_PATH.to_owned(),
            },
            log_level: "info".to_owned(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PORT`: port to bind on (binds to `0.0.0.0`)
    /// - `INSTASITE_BIND_ADDR`: full bind address (overrides `PORT`, default: `127.0.0.1:8300`)
    /// - `INSTASITE_STORAGE`: `memory`, `file`, `redb`, or `none` (default: `file`)
    /// - `INSTASITE_STORAGE_PATH`: path for persistent backends (default: `./data/instasite.json`)
    /// - `INSTASITE_LOG_LEVEL`: log filter (default: `info`)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to a value that cannot
    /// be used.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a variable is set to a value that cannot
    /// be used.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        // Priority: INSTASITE_BIND_ADDR > PORT > default.
        let bind_addr = if let Some(addr) = lookup("INSTASITE_BIND_ADDR") {
            addr.parse().map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                var: "INSTASITE_BIND_ADDR",
                value: addr.clone(),
                reason: e.to_string(),
            })?
        } else if let Some(port) = lookup("PORT") {
            let port: u16 = port.parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::Invalid {
                    var: "PORT",
                    value: port.clone(),
                    reason: e.to_string(),
                }
            })?;
            SocketAddr::from(([0, 0, 0, 0], port))
        } else {
            defaults.bind_addr
        };

        let storage_path =
            lookup("INSTASITE_STORAGE_PATH").unwrap_or_else(|| DEFAULT_STORAGE_PATH.to_owned());

        let storage_backend = match lookup("INSTASITE_STORAGE")
            .unwrap_or_else(|| "file".to_owned())
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageBackendType::Memory,
            "file" => StorageBackendType::File { path: storage_path },
            "redb" => StorageBackendType::Redb { path: storage_path },
            "none" => StorageBackendType::None,
            other => {
                return Err(ConfigError::UnknownStorage {
                    value: other.to_owned(),
                });
            }
        };

        let log_level = lookup("INSTASITE_LOG_LEVEL").unwrap_or(defaults.log_level);

        Ok(Self {
            bind_addr,
            storage_backend,
            log_level,
        })
    }
}
