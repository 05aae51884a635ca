//! Presentation layer for the sign-in form
//!
//! The controller never draws anything itself. It hands each new
//! [`FormState`] to a [`FormView`] and then runs the [`ViewEffect`]s that
//! were queued for "after the next render", such as moving focus back to the
//! password input once it is enabled again.

use crate::auth::credentials::Field;
use crate::controller::FormState;

pub mod terminal;

pub use terminal::TerminalView;

/// Work that must run after the view has rendered a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewEffect {
    /// Move keyboard focus to a field
    Focus(Field),
}

/// Renders the form and owns input focus
pub trait FormView: Send + Sync {
    /// Reflect `state`: disabled inputs, field values, error text
    fn render(&self, state: &FormState);

    /// Move focus to `field`. Only called when the field is enabled in the
    /// last rendered state.
    fn focus(&self, field: Field);

    /// Show a transient success notice
    fn notify_success(&self, _message: &str) {}
}

/// View that draws nothing
#[derive(Debug, Default)]
pub struct NullView;

impl FormView for NullView {
    fn render(&self, _state: &FormState) {}

    fn focus(&self, _field: Field) {}
}
