//! Orchestrator configuration loaded from `convoy.toml`.
//!
//! [`ConvoyConfig`] holds every tunable. Values missing from the file use
//! sensible defaults. `CONVOY_REMOTE_URL` takes precedence over the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ConvoyError;
use crate::remote::client::DEFAULT_BASE_URL;

pub const CONFIG_FILE: &str = "convoy.toml";
pub const REMOTE_URL_ENV: &str = "CONVOY_REMOTE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvoyConfig {
    /// Base URL of the carrier/warehouse service.
    #[serde(default = "default_remote_url")]
    pub remote_url: String,

    /// Delay between two polls of the same job.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of jobs driven at the same time.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Directory receiving confirmation files.
    #[serde(default = "default_confirmation_dir")]
    pub confirmation_dir: PathBuf,

    /// Connect and request timeout for remote calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_remote_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_concurrency() -> usize {
    5
}

fn default_confirmation_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for ConvoyConfig {
    fn default() -> Self {
        Self {
            remote_url: default_remote_url(),
            poll_interval_ms: default_poll_interval_ms(),
            max_concurrency: default_max_concurrency(),
            confirmation_dir: default_confirmation_dir(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ConvoyConfig {
    /// Load `convoy.toml` from the current directory, falling back to defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE), false)
    }

    /// Load configuration from `path`. A missing file is an error only when
    /// `required` is set.
    pub fn load_from(path: &Path, required: bool) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            toml::from_str::<ConvoyConfig>(&contents)
                .map_err(ConvoyError::from)
                .with_context(|| format!("failed to parse {}", path.display()))?
        } else if required {
            anyhow::bail!("config file {} not found", path.display());
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(REMOTE_URL_ENV)
            && !url.is_empty()
        {
            config.remote_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConvoyError> {
        if self.max_concurrency == 0 {
            return Err(ConvoyError::Config("max_concurrency must be at least 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConvoyError::Config("poll_interval_ms must be positive".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConvoyError::Config("request_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
