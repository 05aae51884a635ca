use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::FailureKind;

/// Opaque session credential issued by a successful login.
///
/// The value cannot be changed after it is issued. `Debug` never prints it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    value: String,
    issued_at: DateTime<Utc>,
}

impl SessionToken {
    /// Wrap a freshly issued token
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            issued_at: Utc::now(),
        }
    }

    /// Rebuild a token that was persisted earlier
    pub fn restored(value: impl Into<String>, issued_at: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            issued_at,
        }
    }

    /// The raw credential, for attaching to outgoing requests
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// When the client received this token
    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionToken")
            .field("value", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

/// Result of exactly one login attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The server accepted the credentials and issued a token
    Success(SessionToken),

    /// The server declined the credentials
    Rejected {
        /// Machine-readable code, used as the localization key
        error_code: String,
        /// Server-provided text, used when the code has no translation
        message: Option<String>,
    },

    /// The exchange failed below the credential check
    TransportFailure(String),

    /// A cross-cutting handler already showed this failure to the user
    AlreadyHandled(FailureKind),
}

impl LoginOutcome {
    /// Build a rejection carrying only an error code
    pub fn rejected(error_code: impl Into<String>) -> Self {
        LoginOutcome::Rejected {
            error_code: error_code.into(),
            message: None,
        }
    }

    /// Build a transport failure
    pub fn transport(message: impl Into<String>) -> Self {
        LoginOutcome::TransportFailure(message.into())
    }

    /// Which arm this outcome is, without its payload
    pub fn kind(&self) -> OutcomeKind {
        match self {
            LoginOutcome::Success(_) => OutcomeKind::Success,
            LoginOutcome::Rejected { .. } => OutcomeKind::Rejected,
            LoginOutcome::TransportFailure(_) => OutcomeKind::TransportFailure,
            LoginOutcome::AlreadyHandled(_) => OutcomeKind::AlreadyHandled,
        }
    }
}

/// Payload-free tag of a [`LoginOutcome`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Rejected,
    TransportFailure,
    AlreadyHandled,
}
