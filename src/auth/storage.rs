use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::auth::token::SessionToken;
use crate::error::{SignInError, SignInResult};

/// Holds the session credential for the rest of the application
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist the token so later reads observe it
    async fn set(&self, token: SessionToken) -> SignInResult<()>;

    /// The stored token, or `None` when nobody has signed in
    async fn get(&self) -> SignInResult<Option<SessionToken>>;

    /// Forget the stored token
    async fn clear(&self) -> SignInResult<()>;
}

/// Process-lifetime session storage
#[derive(Default)]
pub struct MemorySessionStore {
    token: RwLock<Option<SessionToken>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, token: SessionToken) -> SignInResult<()> {
        *self.token.write().await = Some(token);
        debug!("Session token stored in memory");
        Ok(())
    }

    async fn get(&self) -> SignInResult<Option<SessionToken>> {
        Ok(self.token.read().await.clone())
    }

    async fn clear(&self) -> SignInResult<()> {
        *self.token.write().await = None;
        Ok(())
    }
}

/// On-disk layout of a persisted session
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionPayload {
    token: String,
    issued_at: DateTime<Utc>,
    stored_at: DateTime<Utc>,
    /// Hash to detect edits to the file
    integrity_hash: String,
}

/// Session storage backed by a JSON file with an integrity hash
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Create a store that reads and writes `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn calculate_integrity_hash(token: &str, issued_at: &DateTime<Utc>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(format!("{}:{}", token, issued_at.to_rfc3339()).as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn set(&self, token: SessionToken) -> SignInResult<()> {
        let payload = SessionPayload {
            integrity_hash: Self::calculate_integrity_hash(token.as_str(), &token.issued_at()),
            token: token.as_str().to_string(),
            issued_at: token.issued_at(),
            stored_at: Utc::now(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_vec_pretty(&payload)?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            error!(path = %self.path.display(), error = %e, "Failed to write session file");
            SignInError::storage(e)
        })?;

        info!(path = %self.path.display(), "Session token stored");
        Ok(())
    }

    async fn get(&self) -> SignInResult<Option<SessionToken>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No session file found");
                return Ok(None);
            }
            Err(e) => return Err(SignInError::storage(e)),
        };

        let payload: SessionPayload = serde_json::from_slice(&bytes)?;

        let expected = Self::calculate_integrity_hash(&payload.token, &payload.issued_at);
        if expected != payload.integrity_hash {
            error!(path = %self.path.display(), "Session integrity check failed, possible tampering");
            return Err(SignInError::Integrity {
                path: self.path.display().to_string(),
            });
        }

        Ok(Some(SessionToken::restored(payload.token, payload.issued_at)))
    }

    async fn clear(&self) -> SignInResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!(path = %self.path.display(), "Session file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SignInError::storage(e)),
        }
    }
}
