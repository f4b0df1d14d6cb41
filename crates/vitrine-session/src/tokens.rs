//! Token persistence.
//!
//! Access and refresh tokens live outside process memory so that a session
//! survives restarts (the cookie jar of a browser client). Expired tokens are
//! discarded on load.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{Result, SessionError};

/// Default token file name within the vitrine data directory.
pub const TOKEN_FILE: &str = "session-tokens.json";

/// Token material persisted between runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredTokens {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub access_expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub refresh_expires_at: Option<DateTime<Utc>>,
}

impl StoredTokens {
    /// Build a record for freshly issued tokens with their max ages.
    pub fn issued(
        access_token: &str,
        access_max_age: std::time::Duration,
        refresh_token: Option<&str>,
        refresh_max_age: std::time::Duration,
    ) -> Self {
        let now = Utc::now();
        Self {
            access_token: Some(access_token.to_string()),
            access_expires_at: Some(now + to_chrono(access_max_age)),
            refresh_token: refresh_token.map(str::to_string),
            refresh_expires_at: refresh_token.map(|_| now + to_chrono(refresh_max_age)),
        }
    }

    /// Drop any token whose expiry has passed.
    pub fn without_expired(mut self, now: DateTime<Utc>) -> Self {
        if self.access_expires_at.is_some_and(|at| at <= now) {
            self.access_token = None;
            self.access_expires_at = None;
        }
        if self.refresh_expires_at.is_some_and(|at| at <= now) {
            self.refresh_token = None;
            self.refresh_expires_at = None;
        }
        self
    }

    /// True when neither token is present.
    pub fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

fn to_chrono(d: std::time::Duration) -> Duration {
    Duration::from_std(d).unwrap_or_else(|_| Duration::days(36_500))
}

// ============================================================================
// TokenStore Trait
// ============================================================================

/// Persistence for session tokens.
#[async_trait]
pub trait TokenStore: Send + Sync + std::fmt::Debug {
    /// Load unexpired tokens, if any.
    async fn load(&self) -> Result<Option<StoredTokens>>;

    /// Replace the stored tokens.
    async fn save(&self, tokens: &StoredTokens) -> Result<()>;

    /// Remove stored tokens.
    async fn clear(&self) -> Result<()>;
}

/// Shared token store for use across async contexts.
pub type SharedTokenStore = Arc<dyn TokenStore>;

// ============================================================================
// FileTokenStore
// ============================================================================

/// File-based token store for production use.
#[derive(Debug)]
pub struct FileTokenStore {
    token_path: PathBuf,
    cached: RwLock<Option<StoredTokens>>,
}

impl FileTokenStore {
    /// Create a store inside the given data directory.
    pub fn new(data_dir: &Path) -> Self {
        Self::with_path(data_dir.join(TOKEN_FILE))
    }

    /// Create with a custom token path.
    pub fn with_path(token_path: PathBuf) -> Self {
        Self {
            token_path,
            cached: RwLock::new(None),
        }
    }

    /// Get the token file path.
    pub fn token_path(&self) -> &Path {
        &self.token_path
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<StoredTokens>> {
        {
            let cache = self.cached.read().await;
            if let Some(tokens) = cache.as_ref() {
                return Ok(Some(tokens.clone().without_expired(Utc::now()))
                    .filter(|t| !t.is_empty()));
            }
        }

        if !self.token_path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&self.token_path)
            .await
            .map_err(|e| SessionError::Storage(format!("Failed to read token file: {}", e)))?;

        let tokens: StoredTokens = serde_json::from_str(&content).map_err(|e| {
            SessionError::Serialization(format!("Failed to parse token file: {}", e))
        })?;

        let tokens = tokens.without_expired(Utc::now());
        *self.cached.write().await = Some(tokens.clone());

        Ok(Some(tokens).filter(|t| !t.is_empty()))
    }

    async fn save(&self, tokens: &StoredTokens) -> Result<()> {
        if let Some(parent) = self.token_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                SessionError::Storage(format!("Failed to create token directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(tokens).map_err(|e| {
            SessionError::Serialization(format!("Failed to serialize tokens: {}", e))
        })?;

        tokio::fs::write(&self.token_path, json)
            .await
            .map_err(|e| SessionError::Storage(format!("Failed to write token file: {}", e)))?;

        *self.cached.write().await = Some(tokens.clone());

        tracing::debug!("Tokens saved to {}", self.token_path.display());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if self.token_path.exists() {
            tokio::fs::remove_file(&self.token_path)
                .await
                .map_err(|e| SessionError::Storage(format!("Failed to delete token file: {}", e)))?;
        }
        *self.cached.write().await = None;
        Ok(())
    }
}

// ============================================================================
// InMemoryTokenStore (for testing)
// ============================================================================

/// In-memory token store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    tokens: RwLock<Option<StoredTokens>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn load(&self) -> Result<Option<StoredTokens>> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .clone()
            .map(|t| t.without_expired(Utc::now()))
            .filter(|t| !t.is_empty()))
    }

    async fn save(&self, tokens: &StoredTokens) -> Result<()> {
        *self.tokens.write().await = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.tokens.write().await = None;
        Ok(())
    }
}

/// Create a shared file-based token store.
pub fn create_token_store(data_dir: &Path) -> SharedTokenStore {
    Arc::new(FileTokenStore::new(data_dir))
}

/// Create a shared in-memory token store.
pub fn create_memory_token_store() -> SharedTokenStore {
    Arc::new(InMemoryTokenStore::new())
}
