//! Resolves the shared download secret.
//!
//! The secret lives in a key/value store under one of several candidate
//! names, probed in order. Nothing is cached: every call reads the store, so
//! a rotated secret is honoured by the very next request.

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Secret names probed when none are configured, in priority order.
pub const DEFAULT_TOKEN_KEYS: [&str; 2] = ["download_token", "token"];

#[derive(Debug, Error)]
pub enum SecretError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type SecretResult<T> = Result<T, SecretError>;

/// Point reads against a key/value secret store.
#[async_trait]
pub trait SecretStore: Send + Sync + 'static {
    async fn get(&self, name: &str) -> SecretResult<Option<String>>;
}

/// Secrets kept in the `secrets` table of a SQLite database.
#[derive(Clone)]
pub struct SqliteSecretStore {
    pub db: Arc<SqlitePool>,
}

impl SqliteSecretStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SecretStore for SqliteSecretStore {
    async fn get(&self, name: &str) -> SecretResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM secrets WHERE name = ?")
            .bind(name)
            .fetch_optional(&*self.db)
            .await?;
        Ok(value)
    }
}

/// Decides which token downloads must present.
#[derive(Clone)]
pub struct TokenAuthority {
    store: Arc<dyn SecretStore>,
    candidates: Arc<[String]>,
}

impl TokenAuthority {
    pub fn new(store: Arc<dyn SecretStore>, candidates: Vec<String>) -> Self {
        Self {
            store,
            candidates: candidates.into(),
        }
    }

    /// Authority probing [`DEFAULT_TOKEN_KEYS`].
    #[cfg(test)]
    pub fn with_default_keys(store: Arc<dyn SecretStore>) -> Self {
        Self::new(
            store,
            DEFAULT_TOKEN_KEYS.iter().map(|k| k.to_string()).collect(),
        )
    }

    /// The first candidate holding a non-empty value, or `None` when the
    /// deployment has no token configured.
    pub async fn resolve_expected_token(&self) -> SecretResult<Option<String>> {
        for name in self.candidates.iter() {
            match self.store.get(name).await? {
                Some(value) if !value.is_empty() => {
                    debug!(secret = %name, "resolved download token");
                    return Ok(Some(value));
                }
                _ => continue,
            }
        }
        Ok(None)
    }
}
