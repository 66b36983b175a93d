//! Settle-once promises and structured rejection values.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use super::{HostObject, HostValue};

/// Outcome of a settled promise: `Ok` when resolved, `Err` when rejected.
pub type Settlement = Result<HostValue, HostValue>;

type Reaction = Box<dyn FnOnce(&Settlement) + Send>;

/// Observable state of a promise.
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseState {
    Pending,
    Resolved(HostValue),
    Rejected(HostValue),
}

impl PromiseState {
    pub fn is_pending(&self) -> bool {
        matches!(self, PromiseState::Pending)
    }
}

struct Shared {
    inner: Mutex<Inner>,
}

struct Inner {
    settlement: Option<Settlement>,
    reactions: Vec<Reaction>,
}

/// Host-side view of an asynchronous result.
#[derive(Clone)]
pub struct Promise {
    shared: Arc<Shared>,
}

/// Resolving side of a [`Promise`].
///
/// The first settlement wins; later attempts are ignored and report `false`.
#[derive(Clone)]
pub struct Deferred {
    shared: Arc<Shared>,
}

impl Promise {
    /// Create a pending promise and its resolver.
    pub fn pending() -> (Promise, Deferred) {
        let shared = Arc::new(Shared {
            inner: Mutex::new(Inner {
                settlement: None,
                reactions: Vec::new(),
            }),
        });
        (
            Promise {
                shared: shared.clone(),
            },
            Deferred { shared },
        )
    }

    pub fn resolved(value: HostValue) -> Promise {
        let (promise, deferred) = Promise::pending();
        deferred.resolve(value);
        promise
    }

    pub fn rejected(reason: HostValue) -> Promise {
        let (promise, deferred) = Promise::pending();
        deferred.reject(reason);
        promise
    }

    pub fn state(&self) -> PromiseState {
        match &self.shared.inner.lock().settlement {
            None => PromiseState::Pending,
            Some(Ok(value)) => PromiseState::Resolved(value.clone()),
            Some(Err(reason)) => PromiseState::Rejected(reason.clone()),
        }
    }

    /// The settlement, or `None` while pending.
    pub fn settlement(&self) -> Option<Settlement> {
        self.shared.inner.lock().settlement.clone()
    }

    pub fn is_pending(&self) -> bool {
        self.shared.inner.lock().settlement.is_none()
    }

    /// Register a reaction that runs once the promise settles.
    ///
    /// Runs immediately when the promise is already settled.
    pub fn on_settled(&self, reaction: impl FnOnce(&Settlement) + Send + 'static) {
        let mut inner = self.shared.inner.lock();
        match inner.settlement.clone() {
            Some(settlement) => {
                drop(inner);
                reaction(&settlement);
            }
            None => inner.reactions.push(Box::new(reaction)),
        }
    }

    pub fn ptr_eq(&self, other: &Promise) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl fmt::Debug for Promise {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state() {
            PromiseState::Pending => write!(f, "Promise {{ <pending> }}"),
            PromiseState::Resolved(v) => write!(f, "Promise {{ {v:?} }}"),
            PromiseState::Rejected(r) => write!(f, "Promise {{ <rejected> {r:?} }}"),
        }
    }
}

impl Deferred {
    pub fn resolve(&self, value: HostValue) -> bool {
        self.settle(Ok(value))
    }

    pub fn reject(&self, reason: HostValue) -> bool {
        self.settle(Err(reason))
    }

    /// Settle the promise. Returns `false` if it was already settled.
    pub fn settle(&self, settlement: Settlement) -> bool {
        let reactions = {
            let mut inner = self.shared.inner.lock();
            if inner.settlement.is_some() {
                return false;
            }
            inner.settlement = Some(settlement.clone());
            std::mem::take(&mut inner.reactions)
        };
        for reaction in reactions {
            reaction(&settlement);
        }
        true
    }

    pub fn promise(&self) -> Promise {
        Promise {
            shared: self.shared.clone(),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.shared.inner.lock().settlement.is_some()
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred")
            .field("settled", &self.is_settled())
            .finish()
    }
}

// ============================================================================
// Rejection values
// ============================================================================

/// Why an asynchronous operation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectStatus {
    /// The native callable failed
    Error,
    /// The operation was canceled
    Canceled,
}

impl RejectStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectStatus::Error => "error",
            RejectStatus::Canceled => "canceled",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "error" => Some(RejectStatus::Error),
            "canceled" => Some(RejectStatus::Canceled),
            _ => None,
        }
    }
}

/// Structured rejection payload `{result?, native?, status}`.
///
/// `native` is present and `true` when the rejection came from the native
/// side (worker failure or observed cancellation), and absent when the host
/// side rejected on its own, such as a cancel that prevented the start.
#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub status: RejectStatus,
    pub native: bool,
    pub result: Option<HostValue>,
}

impl Rejection {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: RejectStatus::Error,
            native: true,
            result: Some(HostValue::String(message.into())),
        }
    }

    pub fn canceled(native: bool, result: Option<HostValue>) -> Self {
        Self {
            status: RejectStatus::Canceled,
            native,
            result,
        }
    }

    pub fn into_host(self) -> HostValue {
        let mut obj = HostObject::new();
        if let Some(result) = self.result {
            obj.set("result", result);
        }
        if self.native {
            obj.set("native", true);
        }
        obj.set("status", self.status.as_str());
        HostValue::Object(obj)
    }

    /// Parse a rejection payload produced by [`into_host`](Self::into_host).
    pub fn from_host(value: &HostValue) -> Option<Self> {
        let obj = value.as_object()?;
        let status = RejectStatus::parse(obj.get("status")?.as_str()?)?;
        let native = obj.get("native").and_then(HostValue::as_bool).unwrap_or(false);
        let result = obj.get("result").cloned();
        Some(Self {
            status,
            native,
            result,
        })
    }
}
