//! Persistent TTL cache for external API responses
//!
//! Entries are `postcard`-encoded into a `fjall` keyspace together with
//! their expiry timestamp. Expired entries read as a miss and are removed.

use std::fmt::Debug;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use fjall::Keyspace;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::task;

use crate::{AssistantError, Result};

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

pub struct PersistentCache {
    _db: fjall::Database,
    store: Keyspace,
}

fn cache_err(e: impl std::fmt::Display) -> AssistantError {
    AssistantError::cache(e.to_string())
}

fn now_secs() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(cache_err)?
        .as_secs())
}

impl PersistentCache {
    /// Open (or create) the cache database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(path.as_ref()).open().map_err(cache_err)?;
        let items = db
            .keyspace("cache", fjall::KeyspaceCreateOptions::default)
            .map_err(cache_err)?;
        Ok(PersistentCache { _db: db, store: items })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or_else(|| AssistantError::cache("TTL overflow"))?
            .duration_since(UNIX_EPOCH)
            .map_err(cache_err)?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry).map_err(cache_err)?;

        task::spawn_blocking(move || store.insert(key, bytes))
            .await
            .map_err(cache_err)?
            .map_err(cache_err)?;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> = task::spawn_blocking(move || {
            store.get(key_bytes).map(|v| v.map(|bytes| bytes.to_vec()))
        })
        .await
        .map_err(cache_err)?
        .map_err(cache_err)?;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = match postcard::from_bytes(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                // Layout changed between versions, treat as a miss
                tracing::warn!("Dropping undecodable cache entry: {e}");
                self.remove(key).await?;
                return Ok(None);
            }
        };

        if now_secs()? < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key))
            .await
            .map_err(cache_err)?
            .map_err(cache_err)?;
        Ok(())
    }
}
