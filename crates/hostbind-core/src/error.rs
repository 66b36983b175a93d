//! Error types for binding native code to host values.
//!
//! The taxonomy follows the phases of a bound call:
//! - [`ConversionError`]: a single value could not cross the boundary
//! - [`BindError`]: the host arguments do not fit the native signature
//! - [`NativeError`]: the native callable failed while running
//! - [`CallError`]: either of the last two, as seen by a bound entry point
//!
//! [`HostError`] is the host-visible exception those errors turn into.

use std::fmt;

use thiserror::Error;

// ============================================================================
// Conversion Errors
// ============================================================================

/// Errors that can occur when converting a single host value to a native type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    /// The host value has the wrong kind for the target type
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// A numeric value does not fit in the target integer type
    #[error("integer overflow: value {value} does not fit in {target_type}")]
    IntegerOverflow {
        value: String,
        target_type: &'static str,
    },

    /// A number with a fractional part was given for an integer type
    #[error("value {value} is not an integer ({target_type} expected)")]
    NotIntegral { value: f64, target_type: &'static str },

    /// A numeric value is not a valid discriminant of the target enum
    #[error("value {value} is not a valid {target_type}")]
    InvalidEnumValue {
        value: String,
        target_type: &'static str,
    },

    /// A host function is not attached to a host environment
    #[error("function '{name}' is not attached to a host event loop")]
    Detached { name: String },

    /// Element of a sequence failed to convert
    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<ConversionError>,
    },

    /// Generic conversion failure
    #[error("conversion failed: {message}")]
    Failed { message: String },
}

impl ConversionError {
    /// Create a type mismatch error.
    pub fn mismatch(expected: &'static str, actual: &'static str) -> Self {
        ConversionError::TypeMismatch { expected, actual }
    }

    /// Create a generic conversion error.
    pub fn failed(message: impl Into<String>) -> Self {
        ConversionError::Failed {
            message: message.into(),
        }
    }

    /// Wrap this error as the failure of element `index` of a sequence.
    pub fn in_element(self, index: usize) -> Self {
        ConversionError::Element {
            index,
            source: Box::new(self),
        }
    }
}

// ============================================================================
// Binding Errors
// ============================================================================

/// Errors raised while binding host arguments to a native parameter list.
///
/// These are always reported immediately to the caller, before the native
/// callable runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    /// Argument count does not match the parameter count after defaults
    #[error("wrong number of arguments: expected {}, got {got}", arity_range(.min, .max))]
    Arity { min: usize, max: usize, got: usize },

    /// The first argument whose kind cannot convert to its parameter type
    #[error("type of arg{index} is mismatched: expected {expected}, got {actual}")]
    TypeMismatch {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },

    /// An argument passed the convertibility check but failed to convert
    #[error("argument {index}: {source}")]
    Conversion {
        index: usize,
        #[source]
        source: ConversionError,
    },

    /// Default values were supplied for a non-trailing run of parameters
    #[error("default arguments must cover a trailing run of parameters")]
    InvalidDefaults,
}

fn arity_range(min: &usize, max: &usize) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{min} to {max}")
    }
}

impl BindError {
    /// The offending argument position, if the error is about one argument.
    pub fn index(&self) -> Option<usize> {
        match self {
            BindError::TypeMismatch { index, .. } | BindError::Conversion { index, .. } => {
                Some(*index)
            }
            BindError::Arity { .. } | BindError::InvalidDefaults => None,
        }
    }

    /// Message in the form host code sees it.
    pub fn host_message(&self) -> String {
        match self {
            BindError::Arity { .. } => "Wrong number of arguments".to_string(),
            BindError::TypeMismatch { index, .. } | BindError::Conversion { index, .. } => {
                format!("Type of arg{index} is mismatched")
            }
            BindError::InvalidDefaults => self.to_string(),
        }
    }
}

// ============================================================================
// Native Execution Errors
// ============================================================================

/// Errors that can occur during native function execution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// The native callable reported a failure
    #[error("{message}")]
    Failed { message: String },

    /// Native function panicked
    #[error("native function panicked: {message}")]
    Panic { message: String },

    /// Error converting a value inside the native call
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// A by-value receiver was already moved into an earlier call
    #[error("receiver of type {type_name} was consumed by an earlier call")]
    ReceiverConsumed { type_name: &'static str },

    /// A host-thread-only callable was invoked from another thread
    #[error("invalid call to '{function}' from a foreign thread - use CrossThreadChannel")]
    ThreadAffinity { function: String },

    /// A host callable threw while being called from native code
    #[error("host exception: {0}")]
    Host(HostError),
}

impl NativeError {
    /// Create a failure with a message.
    pub fn failed(message: impl Into<String>) -> Self {
        NativeError::Failed {
            message: message.into(),
        }
    }

    /// Build a panic error from a caught panic payload.
    pub fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        NativeError::Panic { message }
    }
}

impl From<String> for NativeError {
    fn from(message: String) -> Self {
        NativeError::Failed { message }
    }
}

impl From<&str> for NativeError {
    fn from(message: &str) -> Self {
        NativeError::failed(message)
    }
}

impl From<anyhow::Error> for NativeError {
    fn from(err: anyhow::Error) -> Self {
        NativeError::Failed {
            message: format!("{err:#}"),
        }
    }
}

impl From<HostError> for NativeError {
    fn from(err: HostError) -> Self {
        NativeError::Host(err)
    }
}

// ============================================================================
// Call Errors
// ============================================================================

/// Error returned by a bound entry point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    #[error(transparent)]
    Bind(#[from] BindError),

    #[error(transparent)]
    Native(#[from] NativeError),
}

impl CallError {
    /// Convert into the exception raised on the host side.
    ///
    /// Binding failures surface as `TypeError`; native failures as plain
    /// errors, except host exceptions, which pass through unchanged.
    pub fn into_host_error(self) -> HostError {
        match self {
            CallError::Bind(err) => HostError::type_error(err.host_message()),
            CallError::Native(NativeError::Host(err)) => err,
            CallError::Native(err) => HostError::error(err.to_string()),
        }
    }
}

impl From<ConversionError> for CallError {
    fn from(err: ConversionError) -> Self {
        CallError::Native(NativeError::Conversion(err))
    }
}

// ============================================================================
// Host Exceptions
// ============================================================================

/// Kind of a host-visible exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostErrorKind {
    Error,
    TypeError,
    RangeError,
}

impl HostErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            HostErrorKind::Error => "Error",
            HostErrorKind::TypeError => "TypeError",
            HostErrorKind::RangeError => "RangeError",
        }
    }
}

/// An exception thrown on the host side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub kind: HostErrorKind,
    pub message: String,
}

impl HostError {
    pub fn new(kind: HostErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::Error, message)
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::TypeError, message)
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(HostErrorKind::RangeError, message)
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.name(), self.message)
    }
}

impl std::error::Error for HostError {}

/// Result of invoking a host function.
pub type HostResult<T> = Result<T, HostError>;
