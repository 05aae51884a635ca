use serde::{Deserialize, Serialize};
use std::fmt;

/// The two inputs of the sign-in form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Username,
    Password,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Username => write!(f, "username"),
            Field::Password => write!(f, "password"),
        }
    }
}

/// Username/password pair submitted to the login endpoint.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Create a new credentials pair
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Get the value of a single field
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Username => &self.username,
            Field::Password => &self.password,
        }
    }

    /// Replace the value of a single field
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        match field {
            Field::Username => self.username = value.into(),
            Field::Password => self.password = value.into(),
        }
    }

    /// First field that is empty, checked in form order
    pub fn first_missing(&self) -> Option<Field> {
        [Field::Username, Field::Password]
            .into_iter()
            .find(|field| self.get(*field).is_empty())
    }
}

// Never print the password, not even in debug logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
