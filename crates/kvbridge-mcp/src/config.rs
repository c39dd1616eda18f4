//! Server configuration.
//!
//! Values are resolved from, lowest to highest precedence: built-in defaults,
//! an optional TOML file, environment variables, and command-line arguments.
//! Environment variables are read by clap alongside their flags, so a flag
//! given on the command line always wins over its variable.
//!
//! ```toml
//! redis_url = "redis://cache.internal:6379/0"
//! log_level = "info"
//! command_timeout_ms = 30000
//!
//! [reconnect]
//! max_attempts = 5
//! initial_delay_ms = 1000
//! max_delay_ms = 30000
//! ```

use clap::Parser;
use kvbridge_core::{Error, Result};
use kvbridge_store::ReconnectPolicy;
use kvbridge_store::policy::{DEFAULT_INITIAL_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Store URL used when none is configured.
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

/// Log level used when none is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

const ALLOWED_SCHEMES: &[&str] = &["redis", "rediss", "unix", "redis+unix"];

// ============================================================================
// Command line
// ============================================================================

/// Expose a Redis server to MCP clients over stdio.
#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Redis connection URL (e.g. redis://localhost:6379)
    #[arg(env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Path to a TOML configuration file
    #[arg(short, long, env = "KVBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level or filter directive (e.g. debug, kvbridge_store=trace)
    #[arg(long, env = "KVBRIDGE_LOG")]
    pub log_level: Option<String>,
}

// ============================================================================
// ServerConfig
// ============================================================================

/// Reconnection settings, in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectConfig {
    /// Attempts per reconnection cycle
    pub max_attempts: u32,
    /// Delay before the first attempt
    pub initial_delay_ms: u64,
    /// Cap on any single delay
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            initial_delay_ms: DEFAULT_INITIAL_DELAY.as_millis() as u64,
            max_delay_ms: DEFAULT_MAX_DELAY.as_millis() as u64,
        }
    }
}

impl ReconnectConfig {
    /// The backoff policy these settings describe.
    pub fn policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }
}

/// Fully resolved server configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Store connection URL
    pub redis_url: String,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    /// Reply timeout for a single command; unset waits indefinitely
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command_timeout_ms: Option<u64>,
    /// Reconnection settings
    pub reconnect: ReconnectConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            redis_url: DEFAULT_REDIS_URL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            command_timeout_ms: None,
            reconnect: ReconnectConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Resolve the configuration for a command line.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        if let Some(url) = &cli.redis_url {
            config.redis_url = url.clone();
        }
        if let Some(level) = &cli.log_level {
            config.log_level = level.clone();
        }
        config.validate()?;
        Ok(config)
    }

    /// The per-command reply timeout, if any.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_ms.map(Duration::from_millis)
    }

    /// Read a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&content)
            .map_err(|e| Error::config(format!("Failed to parse {}: {e}", path.display())))
    }

    /// Parse TOML text.
    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Check values that would otherwise fail later at startup.
    pub fn validate(&self) -> Result<()> {
        let scheme = self
            .redis_url
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| {
                Error::config(format!(
                    "redis_url must look like scheme://..., got '{}'",
                    self.redis_url
                ))
            })?;
        if !ALLOWED_SCHEMES.contains(&scheme) {
            return Err(Error::config(format!(
                "Unsupported URL scheme '{scheme}' (expected one of: {})",
                ALLOWED_SCHEMES.join(", ")
            )));
        }
        if self.log_level.trim().is_empty() {
            return Err(Error::config("log_level must not be empty"));
        }
        if self.command_timeout_ms == Some(0) {
            return Err(Error::config("command_timeout_ms must be greater than 0"));
        }
        if self.reconnect.max_attempts == 0 {
            return Err(Error::config("reconnect.max_attempts must be at least 1"));
        }
        if self.reconnect.initial_delay_ms > self.reconnect.max_delay_ms {
            return Err(Error::config(format!(
                "reconnect.initial_delay_ms ({}) exceeds reconnect.max_delay_ms ({})",
                self.reconnect.initial_delay_ms, self.reconnect.max_delay_ms
            )));
        }
        Ok(())
    }
}
