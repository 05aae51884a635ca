//! Sign-in workflow for the dashboard console.
//!
//! The crate is split the same way the screen is wired at runtime:
//! [`auth`] performs the login exchange and keeps the session token,
//! [`controller`] runs the form state machine, [`view`] draws it, and
//! [`navigation`] moves the user on once they are signed in.

pub mod auth;
pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod http_client;
pub mod i18n;
pub mod navigation;
pub mod view;

pub use auth::{
    AuthClient, Credentials, FailureInterceptor, Field, FileSessionStore, HttpAuthClient,
    LoginFailure, LoginOutcome, MemorySessionStore, OutcomeKind, SessionStore, SessionToken,
};
pub use config::SignInConfig;
pub use controller::{
    FieldEdit, FieldMessage, FormState, Phase, SignInController, SignInControllerBuilder,
    SubmitResult,
};
pub use error::{FailureKind, SignInError, SignInResult, ValidationError};
pub use events::{EventStream, SignInEvent, Subscriber};
pub use http_client::{HttpClient, ReqwestHttpClient, SimpleHttpResponse};
pub use i18n::Localizer;
pub use navigation::{LogNavigator, Navigator, RouteRegistry, StaticRouteRegistry};
pub use view::{FormView, NullView, TerminalView, ViewEffect};
