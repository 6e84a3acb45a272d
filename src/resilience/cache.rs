use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug)]
struct StoredEntry {
    value: serde_json::Value,
    expires_at: Instant,
}

/// In-memory TTL cache shared by every upstream client.
///
/// Values are stored serialized so a single instance can hold geocoding,
/// weather and places results side by side. Expired entries are dropped on the
/// lookup that finds them; nothing sweeps in the background.
#[derive(Debug)]
pub struct Cache {
    store: DashMap<String, StoredEntry>,
    ttl: Duration,
}

impl Cache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            store: DashMap::new(),
            ttl,
        }
    }

    /// Stores a serializable value; it expires `ttl` after this call.
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub fn put<T: Serialize + Debug>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        let value = serde_json::to_value(value)?;
        let expires_at = Instant::now() + self.ttl;
        self.store
            .insert(key.to_string(), StoredEntry { value, expires_at });
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        // the entry guard holds the shard lock, so expiry check and eviction
        // cannot interleave with a concurrent put on the same key
        let Entry::Occupied(entry) = self.store.entry(key.to_string()) else {
            tracing::debug!("Key not found");
            return None;
        };

        if Instant::now() >= entry.get().expires_at {
            tracing::debug!("Key found but expired");
            entry.remove();
            return None;
        }

        match serde_json::from_value(entry.get().value.clone()) {
            Ok(value) => {
                tracing::debug!("Key found and still fresh");
                Some(value)
            }
            Err(e) => {
                tracing::warn!("Dropping cache entry {key} with unexpected shape: {e}");
                entry.remove();
                None
            }
        }
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// Number of stored entries, expired ones included until they are read.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
