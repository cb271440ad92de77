//! Alias → URL directory.
//!
//! Handlers only see the [`UrlDirectory`] trait. Alias uniqueness is enforced
//! by the backing store through set-if-absent writes.

pub mod memory;
pub mod redis;

use std::sync::Arc;

use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use thiserror::Error;
use url::Url;

pub use self::memory::MemoryDirectory;
pub use self::redis::RedisDirectory;

/// Length of generated aliases.
pub const ALIAS_LENGTH: usize = 6;

/// Attempts at generating a free alias before giving up.
pub const MAX_ALIAS_ATTEMPTS: usize = 5;

/// Directory failures.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// No record exists for the alias
    #[error("alias not found")]
    NotFound,

    /// Every generated alias was already taken
    #[error("no free alias after {0} attempts")]
    AliasSpaceExhausted(usize),

    /// Backing store failure
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<::redis::RedisError> for DirectoryError {
    fn from(err: ::redis::RedisError) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Capability to resolve, save and delete aliases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UrlDirectory: Send + Sync {
    /// Returns the URL stored under `alias`.
    async fn resolve(&self, alias: &str) -> Result<String, DirectoryError>;

    /// Stores `url` under a freshly generated alias and returns the alias.
    async fn save(&self, url: &str) -> Result<String, DirectoryError>;

    /// Removes `alias`; [`DirectoryError::NotFound`] if nothing was removed.
    async fn delete(&self, alias: &str) -> Result<(), DirectoryError>;
}

/// Generates a random alphanumeric alias.
#[must_use]
pub fn generate_alias() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ALIAS_LENGTH)
        .map(char::from)
        .collect()
}

/// Opens the directory named by a storage URL.
///
/// # Errors
///
/// Returns [`DirectoryError::Storage`] for unknown schemes or when the Redis
/// connection cannot be established.
pub async fn connect(storage_url: &Url) -> Result<Arc<dyn UrlDirectory>, DirectoryError> {
    match storage_url.scheme() {
        "memory" => Ok(Arc::new(MemoryDirectory::new())),
        "redis" | "rediss" => Ok(Arc::new(RedisDirectory::new(storage_url.as_str()).await?)),
        other => Err(DirectoryError::Storage(format!(
            "unsupported storage scheme: {other}"
        ))),
    }
}
