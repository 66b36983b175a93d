//! Runtime error types.

use std::path::PathBuf;

use hostbind_core::{ConversionError, HostError, NativeError, SchedulerClosed};
use thiserror::Error;

/// Errors from a [`CrossThreadChannel`](crate::CrossThreadChannel).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChannelError {
    /// The channel was released or the host loop shut down
    #[error("channel is closed")]
    Closed,

    /// The channel was created away from its function's host thread
    #[error("cross-thread channel must be created on the host thread")]
    WrongThread,

    /// The function has no host event loop to hop to
    #[error("function '{name}' is not attached to a host event loop")]
    Detached { name: String },

    /// The host function threw
    #[error("host exception: {0}")]
    Host(HostError),

    /// The host function's result has the wrong type
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),
}

impl From<ChannelError> for NativeError {
    fn from(err: ChannelError) -> Self {
        match err {
            ChannelError::Host(err) => NativeError::Host(err),
            ChannelError::Conversion(err) => NativeError::Conversion(err),
            other => NativeError::failed(other.to_string()),
        }
    }
}

/// Errors loading [`RuntimeConfig`](crate::RuntimeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Errors from runtime services.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("worker pool has shut down")]
    PoolClosed,

    #[error(transparent)]
    Closed(#[from] SchedulerClosed),

    #[error("failed to install logging: {0}")]
    Logging(String),
}

impl From<RuntimeError> for NativeError {
    fn from(err: RuntimeError) -> Self {
        NativeError::failed(err.to_string())
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
