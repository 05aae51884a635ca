use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::credentials::Field;
use crate::controller::Phase;
use crate::error::FailureKind;

pub mod streams;
pub use streams::{EventStream, EventStreamStats, EventType, Subscriber};

pub const EVENT_CHANNEL_CAPACITY: usize = 64;
pub const EVENT_BUFFER_SIZE: usize = 32;

/// Something the sign-in controller did that other parts of the app may care about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignInEvent {
    /// The form moved between Idle, Submitting and Error
    PhaseChanged {
        from: Phase,
        to: Phase,
        at: DateTime<Utc>,
    },

    /// Local validation stopped a submit
    ValidationFailed {
        field: Field,
        message: String,
    },

    /// A submit arrived while another attempt was in flight
    AttemptIgnored,

    /// The login succeeded; `message` is the success notification text
    SignedIn {
        attempt_id: Uuid,
        message: String,
        route: String,
    },

    /// The attempt failed. `message` is `None` when the failure was already
    /// reported upstream.
    SignInFailed {
        attempt_id: Uuid,
        kind: FailureKind,
        message: Option<String>,
    },

    /// The outcome arrived after the screen went away and was dropped
    OutcomeDiscarded {
        attempt_id: Uuid,
    },
}

impl EventType for SignInEvent {
    fn event_type(&self) -> &'static str {
        match self {
            SignInEvent::PhaseChanged { .. } => "phase_changed",
            SignInEvent::ValidationFailed { .. } => "validation_failed",
            SignInEvent::AttemptIgnored => "attempt_ignored",
            SignInEvent::SignedIn { .. } => "signed_in",
            SignInEvent::SignInFailed { .. } => "sign_in_failed",
            SignInEvent::OutcomeDiscarded { .. } => "outcome_discarded",
        }
    }
}
