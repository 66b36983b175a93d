//! Host value model.
//!
//! A small, self-contained stand-in for a scripting runtime's values:
//!
//! - [`HostValue`]: the dynamically typed value
//! - [`HostObject`]: ordered property bags
//! - [`HostFunction`]: thread-affine callables
//! - [`Promise`] / [`Deferred`]: settle-once completions
//! - [`HostEnv`] / [`HostScheduler`]: access to the host thread

pub(crate) mod env;
mod function;
mod kinds;
mod object;
mod promise;
mod value;

pub use env::{EnvGuard, HostEnv, HostScheduler, HostTask, SchedulerClosed};
pub use function::HostFunction;
pub use kinds::HostKinds;
pub use object::HostObject;
pub use promise::{Deferred, Promise, PromiseState, RejectStatus, Rejection, Settlement};
pub use value::HostValue;
