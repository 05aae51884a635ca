use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SignInError, SignInResult};

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:12333/dashboard/api";
pub const DEFAULT_USERNAME: &str = "root";
pub const DEFAULT_ROUTE: &str = "/overview";

/// Settings for the sign-in screen and its login client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignInConfig {
    /// Base URL of the dashboard API; the login path is appended to it
    pub api_base_url: String,
    /// Value pre-filled into the username field
    pub default_username: String,
    /// Whether the username field is read-only
    pub username_locked: bool,
    /// Route users land on after signing in
    pub default_route: String,
    /// Transport timeout for the login request, unset means none
    pub request_timeout_secs: Option<u64>,
    /// Where to persist the session token; in memory when unset
    pub session_file: Option<PathBuf>,
    /// JSON translation table layered over the English texts
    pub locale_file: Option<PathBuf>,
}

impl Default for SignInConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            default_username: DEFAULT_USERNAME.to_string(),
            username_locked: true,
            default_route: DEFAULT_ROUTE.to_string(),
            request_timeout_secs: None,
            session_file: None,
            locale_file: None,
        }
    }
}

impl SignInConfig {
    /// Defaults overlaid with `SIGNIN_*` environment variables
    pub fn from_env() -> SignInResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overlaid with values from `lookup`
    pub fn from_lookup<F>(lookup: F) -> SignInResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("SIGNIN_API_URL") {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(SignInError::config("SIGNIN_API_URL", "must be an http(s) URL"));
            }
            config.api_base_url = url;
        }
        if let Some(username) = lookup("SIGNIN_USERNAME") {
            config.default_username = username;
        }
        if let Some(locked) = lookup("SIGNIN_USERNAME_LOCKED") {
            config.username_locked = parse_bool("SIGNIN_USERNAME_LOCKED", &locked)?;
        }
        if let Some(route) = lookup("SIGNIN_DEFAULT_ROUTE") {
            config.default_route = route;
        }
        if let Some(secs) = lookup("SIGNIN_TIMEOUT_SECS") {
            let secs = secs
                .parse::<u64>()
                .map_err(|e| SignInError::config("SIGNIN_TIMEOUT_SECS", e))?;
            config.request_timeout_secs = Some(secs);
        }
        if let Some(path) = lookup("SIGNIN_SESSION_FILE") {
            config.session_file = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("SIGNIN_LOCALE_FILE") {
            config.locale_file = Some(PathBuf::from(path));
        }

        debug!(config = ?config, "Loaded sign-in configuration");
        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_bool(key: &str, value: &str) -> SignInResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SignInError::config(key, format!("'{}' is not a boolean", other))),
    }
}
