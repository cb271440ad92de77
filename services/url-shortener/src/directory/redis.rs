//! Redis-backed [`UrlDirectory`].
//!
//! Each alias is one string key `alias:{alias}`. New aliases are written with
//! `SET NX` so an existing alias is never overwritten.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::debug;

use super::{generate_alias, DirectoryError, UrlDirectory, MAX_ALIAS_ATTEMPTS};

const KEY_PREFIX: &str = "alias:";

/// Redis-backed directory storing one string key per alias.
#[derive(Clone)]
pub struct RedisDirectory {
    conn: ConnectionManager,
}

impl RedisDirectory {
    /// Connects to `redis_url` through a reconnecting connection manager.
    ///
    /// # Errors
    ///
    /// [`DirectoryError::Storage`] if the URL is invalid or the first
    /// connection fails.
    pub async fn new(redis_url: &str) -> Result<Self, DirectoryError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        Ok(RedisDirectory { conn })
    }

    fn key(alias: &str) -> String {
        format!("{KEY_PREFIX}{alias}")
    }
}

#[async_trait]
impl UrlDirectory for RedisDirectory {
    async fn resolve(&self, alias: &str) -> Result<String, DirectoryError> {
        let mut conn = self.conn.clone();

        let value: Option<String> = conn.get(Self::key(alias)).await?;
        value.ok_or(DirectoryError::NotFound)
    }

    async fn save(&self, url: &str) -> Result<String, DirectoryError> {
        let mut conn = self.conn.clone();

        for _ in 0..MAX_ALIAS_ATTEMPTS {
            let alias = generate_alias();
            let created: bool = conn.set_nx(Self::key(&alias), url).await?;
            if created {
                return Ok(alias);
            }
            debug!(alias = %alias, "alias collision, regenerating");
        }

        Err(DirectoryError::AliasSpaceExhausted(MAX_ALIAS_ATTEMPTS))
    }

    async fn delete(&self, alias: &str) -> Result<(), DirectoryError> {
        let mut conn = self.conn.clone();

        let removed: u64 = conn.del(Self::key(alias)).await?;
        if removed == 0 {
            return Err(DirectoryError::NotFound);
        }
        Ok(())
    }
}
