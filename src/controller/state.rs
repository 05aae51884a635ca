use serde::{Deserialize, Serialize};

use crate::auth::credentials::{Credentials, Field};
use crate::auth::token::OutcomeKind;
use crate::error::ValidationError;

/// Where the form is in its sign-in cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Ready to submit, nothing to report
    Idle,
    /// A login attempt is in flight
    Submitting,
    /// Ready to submit, showing the last failure
    Error,
}

impl Phase {
    /// Idle and Error both accept a new submit
    pub fn is_ready(&self) -> bool {
        !matches!(self, Phase::Submitting)
    }
}

/// Inline message attached to one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMessage {
    pub field: Field,
    pub message: String,
}

/// Observable state of the sign-in form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormState {
    pub credentials: Credentials,
    /// Username is pre-filled and read-only
    pub username_locked: bool,
    pub loading: bool,
    pub error_message: Option<String>,
    pub validation: Option<FieldMessage>,
}

impl FormState {
    /// Fresh state for a newly mounted screen
    pub fn new(default_username: impl Into<String>, username_locked: bool) -> Self {
        Self {
            credentials: Credentials::new(default_username, ""),
            username_locked,
            loading: false,
            error_message: None,
            validation: None,
        }
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Submitting
        } else if self.error_message.is_some() {
            Phase::Error
        } else {
            Phase::Idle
        }
    }

    /// Whether the input for `field` currently refuses edits and focus
    pub fn is_disabled(&self, field: Field) -> bool {
        match field {
            Field::Username => self.username_locked || self.loading,
            Field::Password => self.loading,
        }
    }

    /// Drop both the sign-in error and any inline validation message
    pub(crate) fn clear_messages(&mut self) {
        self.error_message = None;
        self.validation = None;
    }
}

/// What a call to `submit` ended up doing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    /// Another attempt was already in flight, or the screen is gone
    Ignored,
    /// Local validation failed; no request was made
    Invalid(ValidationError),
    /// The login finished and the form reflects its outcome
    Completed(OutcomeKind),
    /// The login finished after the screen was unmounted
    Discarded(OutcomeKind),
}

/// What a field edit did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldEdit {
    /// The value was updated
    Applied,
    /// The field is read-only; only the messages were cleared
    Locked,
    /// Inputs are disabled (attempt in flight or screen unmounted)
    Ignored,
}
