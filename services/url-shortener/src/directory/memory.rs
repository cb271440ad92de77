//! In-process directory for local development (`STORAGE_URL=memory://`).

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{generate_alias, DirectoryError, UrlDirectory, MAX_ALIAS_ATTEMPTS};

/// Directory kept in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    records: RwLock<HashMap<String, String>>,
}

impl MemoryDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `url` under a caller-chosen alias.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryError::Storage`] if the alias is taken.
    pub async fn insert(&self, alias: &str, url: &str) -> Result<(), DirectoryError> {
        match self.records.write().await.entry(alias.to_string()) {
            Entry::Occupied(_) => Err(DirectoryError::Storage(format!("alias {alias} exists"))),
            Entry::Vacant(slot) => {
                slot.insert(url.to_string());
                Ok(())
            }
        }
    }
}

#[async_trait]
impl UrlDirectory for MemoryDirectory {
    async fn resolve(&self, alias: &str) -> Result<String, DirectoryError> {
        self.records
            .read()
            .await
            .get(alias)
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    async fn save(&self, url: &str) -> Result<String, DirectoryError> {
        let mut records = self.records.write().await;

        for _ in 0..MAX_ALIAS_ATTEMPTS {
            let alias = generate_alias();
            if let Entry::Vacant(slot) = records.entry(alias.clone()) {
                slot.insert(url.to_string());
                return Ok(alias);
            }
        }

        Err(DirectoryError::AliasSpaceExhausted(MAX_ALIAS_ATTEMPTS))
    }

    async fn delete(&self, alias: &str) -> Result<(), DirectoryError> {
        self.records
            .write()
            .await
            .remove(alias)
            .map(|_| ())
            .ok_or(DirectoryError::NotFound)
    }
}
