//! Configuration for the intake host
//!
//! Loaded from `<config dir>/receipt-intake/config.toml` (or an explicit
//! path), then overridden by `INTAKE_*` environment variables.

use crate::action::DEFAULT_TIMEOUT_SECS;
use crate::error::{Error, Result};
use crate::ingest::{IngestLimits, MAX_FILE_SIZE};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable overriding [`Config::endpoint`]
pub const ENV_ENDPOINT: &str = "INTAKE_ENDPOINT";
/// Environment variable overriding [`Config::token`]
pub const ENV_TOKEN: &str = "INTAKE_TOKEN";
/// Environment variable overriding [`Config::max_file_size`]
pub const ENV_MAX_FILE_SIZE: &str = "INTAKE_MAX_FILE_SIZE";

/// Intake configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Invoice endpoint submissions are posted to
    pub endpoint: Option<String>,
    /// Bearer token for the endpoint
    pub token: Option<String>,
    /// Largest accepted file, in bytes
    pub max_file_size: u64,
    /// Request timeout, in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            max_file_size: MAX_FILE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("receipt-intake").join("config.toml"))
    }

    /// Load configuration and apply environment overrides
    ///
    /// An explicit `path` must exist. Without one, the default location is
    /// used if present, otherwise defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|p| p.is_file()) {
                Some(default) => Self::from_file(&default)?,
                None => {
                    debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_overrides(|key| env::var(key).ok())
    }

    /// Read a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading config");
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&contents)
    }

    /// Parse TOML config
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| Error::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `INTAKE_*` overrides looked up through `lookup`
    pub fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            debug!("endpoint overridden from {ENV_ENDPOINT}");
            self.endpoint = Some(endpoint.trim().to_string());
        }
        if let Some(token) = lookup(ENV_TOKEN) {
            self.token = Some(token.trim().to_string());
        }
        if let Some(size) = lookup(ENV_MAX_FILE_SIZE) {
            self.max_file_size = size.trim().parse().map_err(|e| {
                Error::Config(format!("{ENV_MAX_FILE_SIZE} must be a byte count: {e}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.max_file_size == 0 {
            return Err(Error::Config("max_file_size must be positive".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Ingestion limits derived from this config
    pub const fn limits(&self) -> IngestLimits {
        IngestLimits {
            max_file_size: self.max_file_size,
        }
    }

    /// Request timeout
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
