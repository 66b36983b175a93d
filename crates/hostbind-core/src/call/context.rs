//! Argument list of a single host call.

use crate::convert::FromHost;
use crate::error::BindError;
use crate::host::HostValue;

static UNDEFINED: HostValue = HostValue::Undefined;

/// Context for one invocation of a host-callable function.
///
/// This is a fixed-length, read-only view over the host arguments, owned by
/// the caller's frame for the duration of the call.
///
/// ## Typed Argument Access
///
/// ```ignore
/// let x: i32 = ctx.arg(0)?;
/// let name: String = ctx.arg(1)?;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CallContext<'a> {
    args: &'a [HostValue],
}

impl<'a> CallContext<'a> {
    pub fn new(args: &'a [HostValue]) -> Self {
        Self { args }
    }

    /// Number of arguments supplied by the caller.
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn args(&self) -> &'a [HostValue] {
        self.args
    }

    /// Raw argument at `index`, or `undefined` past the end.
    pub fn get(&self, index: usize) -> &'a HostValue {
        self.args.get(index).unwrap_or(&UNDEFINED)
    }

    /// Raw argument at `index`.
    pub fn arg_slot(&self, index: usize) -> Result<&'a HostValue, BindError> {
        self.args.get(index).ok_or(BindError::Arity {
            min: index + 1,
            max: index + 1,
            got: self.args.len(),
        })
    }

    /// Typed argument at `index`.
    ///
    /// Performs the same check-then-convert sequence as full argument
    /// binding, for a single position.
    pub fn arg<T: FromHost>(&self, index: usize) -> Result<T, BindError> {
        let slot = self.arg_slot(index)?;
        if !T::is_convertible(slot) {
            return Err(BindError::TypeMismatch {
                index,
                expected: T::TYPE_NAME,
                actual: slot.kind_name(),
            });
        }
        T::from_host(slot).map_err(|source| BindError::Conversion { index, source })
    }
}
