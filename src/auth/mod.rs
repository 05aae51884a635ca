pub mod client;
pub mod credentials;
pub mod storage;
pub mod token;

pub use client::{AuthClient, FailureInterceptor, HttpAuthClient, LoginFailure};
pub use credentials::{Credentials, Field};
pub use storage::{FileSessionStore, MemorySessionStore, SessionStore};
pub use token::{LoginOutcome, OutcomeKind, SessionToken};
