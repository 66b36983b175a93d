//! Threading runtime for `hostbind`.
//!
//! - [`HostLoop`]: the host thread's event loop and its [`HostEnv`](hostbind_core::HostEnv)
//! - [`CrossThreadChannel`]: calling host functions from worker threads
//! - [`WorkerPool`] and [`AsyncBridge`]: running natives off the host thread
//!   with promise completion and cooperative cancellation
//! - [`config`] and [`logging`]: TOML configuration and subscriber setup
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use hostbind_runtime::{AsyncBridge, HostLoop, WorkerPool};
//!
//! let host = HostLoop::new();
//! let bridge = AsyncBridge::new(host.env(), Arc::new(WorkerPool::with_threads(2).unwrap()));
//!
//! let handle = bridge.submit(|| 6 * 7).unwrap();
//! let settled = host.block_on(handle.promise()).unwrap();
//! assert_eq!(settled, Ok(42.into()));
//! ```

mod bridge;
mod cancel;
mod channel;
pub mod config;
mod error;
mod event_loop;
pub mod logging;
mod worker;

pub use bridge::{AsyncBridge, AsyncFunction, AsyncHandle, Canceller};
pub use cancel::CancellationToken;
pub use channel::CrossThreadChannel;
pub use config::{LoggingSection, RuntimeConfig, WorkerConfig};
pub use error::{ChannelError, ConfigError, RuntimeError, RuntimeResult};
pub use event_loop::HostLoop;
pub use logging::{LogConfig, LogFormat, LogOutput, init_logging};
pub use worker::WorkerPool;
