use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::auth::credentials::Field;

/// Category of a failed sign-in attempt, used for logging and event payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A required field was missing; no request was made
    Validation,
    /// The server declined the submitted credentials
    RejectedCredentials,
    /// Network or protocol failure, distinct from a rejection
    Transport,
    /// An upstream handler already reported the failure to the user
    AlreadyHandled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::Validation => "validation",
            FailureKind::RejectedCredentials => "rejected_credentials",
            FailureKind::Transport => "transport",
            FailureKind::AlreadyHandled => "already_handled",
        };
        write!(f, "{}", name)
    }
}

/// Local validation failure for a single form field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{field} is required: {message}")]
pub struct ValidationError {
    /// The field that failed validation
    pub field: Field,
    /// Localized message shown next to the field
    pub message: String,
}

/// Error type for the sign-in crate
#[derive(Error, Debug)]
pub enum SignInError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Session storage could not be read or written
    #[error("Session storage failed: {reason}")]
    Storage {
        reason: String,
    },

    /// Stored session data did not match its integrity hash
    #[error("Session integrity check failed for {path}")]
    Integrity {
        path: String,
    },

    /// A configuration value was missing or malformed
    #[error("Invalid configuration for '{key}': {reason}")]
    Config {
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl SignInError {
    /// Create a storage error from any displayable cause
    pub fn storage(reason: impl fmt::Display) -> Self {
        SignInError::Storage {
            reason: reason.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(key: &str, reason: impl fmt::Display) -> Self {
        SignInError::Config {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type for sign-in operations
pub type SignInResult<T> = Result<T, SignInError>;
