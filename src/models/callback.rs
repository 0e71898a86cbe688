//! Callback roles, opaque handles, and bindings.

use serde::{Deserialize, Serialize};

/// Logical role a registered callback fills.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CallbackRole {
    /// Invoked with each new location sample.
    Update,
    /// Invoked once when the tracking session initializes.
    Init,
    /// Invoked when the tracking session is torn down.
    Dispose,
    /// Invoked when the user interacts with the tracking notification.
    NotificationClick,
    /// Entry point the execution context boots from before dispatching
    /// to the role callbacks.
    Dispatcher,
}

impl CallbackRole {
    /// Stable key fragment used when persisting a binding for this role.
    #[must_use]
    pub fn key_fragment(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Init => "init",
            Self::Dispose => "dispose",
            Self::NotificationClick => "notification_click",
            Self::Dispatcher => "dispatcher",
        }
    }
}

/// Opaque, versioned callback identity.
///
/// The `raw` value is meaningful only to the execution context named by
/// `issuer`. A handle read back from the preference store after a
/// process restart may carry a stale issuer; consumers must re-resolve
/// it against the live execution context rather than reuse it blindly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct CallbackHandle {
    /// Raw handle value as minted by the execution context.
    pub raw: i64,
    /// Identity of the execution-context instance that minted the handle.
    pub issuer: String,
}

impl CallbackHandle {
    /// Construct a handle scoped to the given issuer.
    #[must_use]
    pub fn new(raw: i64, issuer: impl Into<String>) -> Self {
        Self {
            raw,
            issuer: issuer.into(),
        }
    }

    /// Whether this handle was minted by the given execution context.
    #[must_use]
    pub fn issued_by(&self, issuer: &str) -> bool {
        self.issuer == issuer
    }
}

/// A registered (role, handle) pair, with optional one-shot aux data.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct CallbackBinding {
    /// Role the handle fills.
    pub role: CallbackRole,
    /// Opaque identity of the callback.
    pub handle: CallbackHandle,
    /// Structured payload handed to the callback once at initialization.
    /// Only meaningful for [`CallbackRole::Init`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aux_data: Option<serde_json::Value>,
}

impl CallbackBinding {
    /// Construct a binding without aux data.
    #[must_use]
    pub fn new(role: CallbackRole, handle: CallbackHandle) -> Self {
        Self {
            role,
            handle,
            aux_data: None,
        }
    }

    /// Attach initialization aux data to the binding.
    #[must_use]
    pub fn with_aux_data(mut self, aux_data: serde_json::Value) -> Self {
        self.aux_data = Some(aux_data);
        self
    }
}
