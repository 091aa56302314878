//! Server configuration.
//!
//! Loaded from a YAML file when one is available, with the `LISTEN`
//! environment variable taking precedence for the bind address.
//!
//! ```yaml
//! server:
//!   listen_addr: "127.0.0.1:9009"
//!   read_timeout_secs: 30
//! limits:
//!   max_header_size: 8190
//!   max_body_size: 10485760
//! ```

use anyhow::Context;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// File read when `WEBTOY_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "webtoy.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Seconds a single socket read may wait; 0 disables the timeout.
    pub read_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:9009".to_string(),
            read_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_header_size: usize,
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            max_header_size: limits.max_header_size,
            max_body_size: limits.max_body_size,
        }
    }
}

impl Config {
    /// Loads configuration from `WEBTOY_CONFIG`, else `webtoy.yaml` if it
    /// exists, else defaults. `LISTEN` overrides the listen address.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("WEBTOY_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            Err(_) => Self::default(),
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Runtime limits for the connection engine.
    pub fn limits(&self) -> Limits {
        Limits {
            max_header_size: self.limits.max_header_size,
            max_body_size: self.limits.max_body_size,
            read_timeout: match self.server.read_timeout_secs {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
        }
    }
}

/// Per-connection resource limits enforced while reading a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum header block size, terminator included (default: `8190`).
    ///
    /// A header block that fills this without a blank line gets a 431.
    pub max_header_size: usize,

    /// Maximum declared `Content-Length` (default: 10 MiB).
    ///
    /// Larger declarations get a 413 before any body byte is read.
    pub max_body_size: usize,

    /// Maximum wait for any single socket read (default: 30 seconds).
    ///
    /// Expiry gets a 408. `None` waits forever.
    pub read_timeout: Option<Duration>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_header_size: 8190,
            max_body_size: 10 * 1024 * 1024,
            read_timeout: Some(Duration::from_secs(30)),
        }
    }
}
