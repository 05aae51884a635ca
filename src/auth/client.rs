//! Login exchange against the remote authentication endpoint
//!
//! [`AuthClient`] turns one login request into exactly one [`LoginOutcome`].
//! Wrong credentials are an ordinary outcome, not an error, so the trait
//! method has no `Result` in its signature.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::auth::credentials::Credentials;
use crate::auth::token::{LoginOutcome, SessionToken};
use crate::error::FailureKind;
use crate::http_client::{HttpClient, SimpleHttpResponse};

/// Path of the login endpoint, relative to the API base URL
pub const LOGIN_PATH: &str = "/user/login";

/// Authentication mode sent with every login request
pub const AUTH_MODE_LOCAL: &str = "local";

/// Performs a single login attempt
#[async_trait]
pub trait AuthClient: Send + Sync {
    /// Submit the credentials once. No retries.
    async fn login(&self, credentials: &Credentials) -> LoginOutcome;
}

/// A failure the HTTP client is about to report, offered to interceptors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginFailure {
    pub kind: FailureKind,
    /// HTTP status, when a response arrived at all
    pub status: Option<u16>,
    /// Error code for rejections, transport text otherwise
    pub detail: String,
}

/// Cross-cutting handler that may report a failure to the user itself.
///
/// Returning `true` means the failure was shown upstream and the sign-in
/// form must not show its own message for it.
pub trait FailureInterceptor: Send + Sync {
    fn intercept(&self, failure: &LoginFailure) -> bool;
}

impl<F> FailureInterceptor for F
where
    F: Fn(&LoginFailure) -> bool + Send + Sync,
{
    fn intercept(&self, failure: &LoginFailure) -> bool {
        self(failure)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
    auth_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginErrorResponse {
    #[serde(alias = "code")]
    error_code: String,
    #[serde(default)]
    message: Option<String>,
}

/// [`AuthClient`] that talks JSON over an [`HttpClient`]
pub struct HttpAuthClient {
    http: Arc<dyn HttpClient>,
    login_url: String,
    interceptors: Vec<Arc<dyn FailureInterceptor>>,
}

impl HttpAuthClient {
    /// Create a client for the API rooted at `api_base_url`
    pub fn new(http: Arc<dyn HttpClient>, api_base_url: &str) -> Self {
        Self {
            http,
            login_url: format!("{}{}", api_base_url.trim_end_matches('/'), LOGIN_PATH),
            interceptors: Vec::new(),
        }
    }

    /// Add an upstream failure handler
    pub fn with_interceptor(mut self, interceptor: Arc<dyn FailureInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Full URL the login request is sent to
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    fn interpret(response: &SimpleHttpResponse) -> LoginOutcome {
        if response.is_success() {
            return match response.json::<LoginResponse>() {
                Ok(LoginResponse { token: Some(token) }) if !token.is_empty() => {
                    LoginOutcome::Success(SessionToken::new(token))
                }
                Ok(_) => LoginOutcome::transport("malformed login response: missing token"),
                Err(e) => LoginOutcome::transport(format!("malformed login response: {}", e)),
            };
        }

        match response.json::<LoginErrorResponse>() {
            Ok(err) => LoginOutcome::Rejected {
                error_code: err.error_code,
                message: err.message,
            },
            Err(_) => {
                let body = response.body().trim();
                if body.is_empty() {
                    LoginOutcome::transport(format!("HTTP {}", response.status()))
                } else {
                    LoginOutcome::transport(format!("HTTP {}: {}", response.status(), body))
                }
            }
        }
    }

    /// Give interceptors the chance to claim a failure
    fn apply_interceptors(&self, outcome: LoginOutcome, status: Option<u16>) -> LoginOutcome {
        let failure = match &outcome {
            LoginOutcome::Rejected { error_code, .. } => LoginFailure {
                kind: FailureKind::RejectedCredentials,
                status,
                detail: error_code.clone(),
            },
            LoginOutcome::TransportFailure(message) => LoginFailure {
                kind: FailureKind::Transport,
                status,
                detail: message.clone(),
            },
            _ => return outcome,
        };

        // Every interceptor sees the failure, even after one has claimed it
        let handled = self
            .interceptors
            .iter()
            .fold(false, |handled, i| i.intercept(&failure) || handled);

        if handled {
            debug!(kind = %failure.kind, "Login failure already handled upstream");
            LoginOutcome::AlreadyHandled(failure.kind)
        } else {
            outcome
        }
    }
}

#[async_trait]
impl AuthClient for HttpAuthClient {
    async fn login(&self, credentials: &Credentials) -> LoginOutcome {
        let request = LoginRequest {
            username: &credentials.username,
            password: &credentials.password,
            auth_mode: AUTH_MODE_LOCAL,
        };

        let body = match serde_json::to_string(&request) {
            Ok(body) => body,
            Err(e) => return LoginOutcome::transport(format!("failed to encode login request: {}", e)),
        };

        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        debug!(url = %self.login_url, username = %credentials.username, "Sending login request");

        let (outcome, status) = match self.http.post(&self.login_url, headers, body).await {
            Ok(response) => (Self::interpret(&response), Some(response.status())),
            Err(e) => {
                warn!(url = %self.login_url, error = %e, "Login request failed");
                (LoginOutcome::transport(e.to_string()), None)
            }
        };

        match &outcome {
            LoginOutcome::Success(_) => info!(username = %credentials.username, "Login accepted"),
            LoginOutcome::Rejected { error_code, .. } => {
                info!(username = %credentials.username, error_code = %error_code, "Login rejected")
            }
            LoginOutcome::TransportFailure(message) => {
                warn!(status = ?status, error = %message, "Login exchange failed")
            }
            LoginOutcome::AlreadyHandled(_) => {}
        }

        self.apply_interceptors(outcome, status)
    }
}
