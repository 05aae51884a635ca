//! Message translation for the sign-in screen
//!
//! Keys follow the dotted naming used by the dashboard's translation files.
//! Placeholders are written `{{name}}`.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, info};

use crate::error::SignInResult;

pub const MSG_SUCCESS: &str = "signin.message.success";
pub const MSG_ERROR: &str = "signin.message.error";
pub const MSG_CHECK_USERNAME: &str = "signin.form.check.username";
pub const MSG_CHECK_PASSWORD: &str = "signin.form.check.password";

/// Translation table keyed by message code
#[derive(Debug, Clone)]
pub struct Localizer {
    messages: HashMap<String, String>,
}

impl Localizer {
    /// An empty table; every lookup falls back to the key
    pub fn empty() -> Self {
        Self {
            messages: HashMap::new(),
        }
    }

    /// Built-in English texts
    pub fn english() -> Self {
        let mut localizer = Self::empty();
        for (key, text) in [
            (MSG_SUCCESS, "Sign in successfully"),
            (MSG_ERROR, "Sign in failed: {{msg}}"),
            (MSG_CHECK_USERNAME, "Please enter username"),
            (MSG_CHECK_PASSWORD, "Please enter password"),
            ("auth.bad_password", "Incorrect username or password"),
            ("auth.user_not_found", "User does not exist"),
            ("auth.locked", "This account is locked"),
        ] {
            localizer.insert(key, text);
        }
        localizer
    }

    /// Load a flat JSON object of `key: text` pairs over the English defaults
    pub async fn from_file(path: &Path) -> SignInResult<Self> {
        let raw = tokio::fs::read(path).await?;
        let table: HashMap<String, String> = serde_json::from_slice(&raw)?;
        info!(path = %path.display(), entries = table.len(), "Loaded translations");

        let mut localizer = Self::english();
        localizer.messages.extend(table);
        Ok(localizer)
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.messages.insert(key.into(), text.into());
    }

    /// The text for `key`, or `None` if it has no translation
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.messages.get(key).map(String::as_str)
    }

    /// The text for `key`, falling back to the key itself
    pub fn translate(&self, key: &str) -> String {
        match self.lookup(key) {
            Some(text) => text.to_string(),
            None => {
                debug!(key = key, "Missing translation");
                key.to_string()
            }
        }
    }

    /// Translate `key` and substitute `{{name}}` placeholders
    pub fn format(&self, key: &str, args: &[(&str, &str)]) -> String {
        let template = self.translate(key);
        args.iter().fold(template, |text, (name, value)| {
            text.replace(&format!("{{{{{}}}}}", name), value)
        })
    }

    /// The form's error line for a failure whose detail is `msg`
    pub fn sign_in_error(&self, msg: &str) -> String {
        self.format(MSG_ERROR, &[("msg", msg)])
    }
}

impl Default for Localizer {
    fn default() -> Self {
        Self::english()
    }
}
