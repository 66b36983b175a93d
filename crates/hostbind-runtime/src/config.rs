//! Runtime configuration.
//!
//! ```toml
//! [workers]
//! threads = 4
//! thread_name = "hostbind-worker"
//!
//! [logging]
//! level = "debug"
//! format = "compact"
//! filter = "hostbind_runtime=trace"
//! ```

use std::fs;
use std::path::Path;
use std::thread;

use serde::Deserialize;
use tracing::Level;

use crate::error::ConfigError;
use crate::logging::{LogConfig, LogFormat, LogOutput};

/// Environment variable overriding [`WorkerConfig::threads`].
pub const WORKER_THREADS_ENV: &str = "HOSTBIND_WORKER_THREADS";

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub workers: WorkerConfig,

    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkerConfig {
    /// Worker count; defaults to the available parallelism
    #[serde(default)]
    pub threads: Option<usize>,

    /// Thread name prefix, suffixed with the worker index
    #[serde(default = "default_thread_name")]
    pub thread_name: String,

    #[serde(default)]
    pub stack_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub filter: Option<String>,

    #[serde(default)]
    pub span_events: bool,
}

fn default_thread_name() -> String {
    "hostbind-worker".to_string()
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            threads: None,
            thread_name: default_thread_name(),
            stack_size: None,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
            filter: None,
            span_events: false,
        }
    }
}

impl WorkerConfig {
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: Some(threads),
            ..Self::default()
        }
    }

    /// The configured count, or the available parallelism.
    pub fn resolved_threads(&self) -> usize {
        self.threads
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, |n| n.get()))
            .max(1)
    }
}

impl LoggingSection {
    pub fn to_log_config(&self) -> Result<LogConfig, ConfigError> {
        let level: Level = self.level.parse().map_err(|_| ConfigError::Invalid {
            key: "logging.level",
            message: format!("unknown level '{}'", self.level),
        })?;
        Ok(LogConfig {
            level,
            format: self.format,
            output: LogOutput::Stderr,
            span_events: self.span_events,
            filter: self.filter.clone(),
        })
    }
}

impl RuntimeConfig {
    /// Load from a TOML file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse from a TOML string. Missing sections take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps variable names to values.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(raw) = lookup(WORKER_THREADS_ENV) {
            let threads = raw.trim().parse::<usize>().map_err(|err| ConfigError::Invalid {
                key: WORKER_THREADS_ENV,
                message: err.to_string(),
            })?;
            self.workers.threads = Some(threads);
        }
        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.workers.threads == Some(0) {
            return Err(ConfigError::Invalid {
                key: "workers.threads",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
