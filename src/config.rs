//! Runtime configuration loaded from TOML.
//!
//! Every key is optional; missing keys take their defaults, and a missing
//! file yields the default configuration.
//!
//! ```toml
//! worker_count = 8
//! retry_delay_secs = 30
//! monitor_interval_ms = 2000
//! ```

use crate::execution::domain::RetryPolicy;
use crate::orchestrator::services::OrchestratorSettings;
use crate::task::domain::{
    DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MINUTES, MAX_RETRY_LIMIT, MAX_TIMEOUT_MINUTES,
};
use crate::worker::WorkerPoolConfig;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },
    /// The document is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is outside its allowed range.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Offending key.
        key: &'static str,
        /// Allowed range.
        reason: String,
    },
}

/// Orchestrion runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrchestrionConfig {
    /// Number of pipeline workers.
    pub worker_count: usize,
    /// Capacity of the work queue.
    pub queue_capacity: usize,
    /// Delay before a failed task is retried, in seconds.
    pub retry_delay_secs: u64,
    /// Pause after every `MONITOR` pass, in milliseconds.
    pub monitor_interval_ms: u64,
    /// Upper bound on driver steps per run.
    pub max_loop_iterations: u32,
    /// Timeout given to planned tasks, in minutes.
    pub default_timeout_minutes: u32,
    /// Retry budget given to planned tasks.
    pub default_max_retries: u32,
}

impl Default for OrchestrionConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            queue_capacity: 256,
            retry_delay_secs: 60,
            monitor_interval_ms: 5000,
            max_loop_iterations: 1000,
            default_timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
            default_max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl OrchestrionConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents or unknown
    /// keys, and [`ConfigError::InvalidValue`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates the file at `path`, falling back to defaults when
    /// it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read, otherwise
    /// the errors of [`Self::from_toml_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = path.as_ref();
        match std::fs::read_to_string(file) {
            Ok(source) => Self::from_toml_str(&source),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %file.display(), "config file missing, using defaults");
                Ok(Self::default())
            }
            Err(err) => Err(ConfigError::Read {
                path: file.to_path_buf(),
                source: err,
            }),
        }
    }

    /// Checks every value against its allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(invalid("worker_count", "must be at least 1"));
        }
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity", "must be at least 1"));
        }
        if self.max_loop_iterations == 0 {
            return Err(invalid("max_loop_iterations", "must be at least 1"));
        }
        if !(1..=MAX_TIMEOUT_MINUTES).contains(&self.default_timeout_minutes) {
            return Err(invalid(
                "default_timeout_minutes",
                format!("must be between 1 and {MAX_TIMEOUT_MINUTES}"),
            ));
        }
        if self.default_max_retries > MAX_RETRY_LIMIT {
            return Err(invalid(
                "default_max_retries",
                format!("must be at most {MAX_RETRY_LIMIT}"),
            ));
        }
        Ok(())
    }

    /// Returns the retry delay.
    #[must_use]
    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Returns the pause after every `MONITOR` pass.
    #[must_use]
    pub const fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms)
    }

    /// Returns the retry policy for the execution pipeline.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_delay())
    }

    /// Returns the orchestrator driver settings.
    #[must_use]
    pub const fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            monitor_interval: self.monitor_interval(),
            max_loop_iterations: self.max_loop_iterations,
            default_timeout_minutes: self.default_timeout_minutes,
            default_max_retries: self.default_max_retries,
        }
    }

    /// Returns the worker pool sizing.
    #[must_use]
    pub const fn worker_pool(&self) -> WorkerPoolConfig {
        WorkerPoolConfig {
            worker_count: self.worker_count,
            queue_capacity: self.queue_capacity,
        }
    }
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        reason: reason.into(),
    }
}
