use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::catalog::CatalogItem;
use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::storage::traits::KeyValueStore;

/// A cached snapshot is valid for 24 hours after it was written.
pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Serialized snapshot of one collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachePartition<T> {
    pub items: Vec<T>,
    /// Write time in epoch milliseconds
    pub timestamp: i64,
}

enum Loaded<T> {
    Missing,
    Expired,
    Corrupt(serde_json::Error),
    Fresh(CachePartition<T>),
}

/// Owner of the single cache partition of one collection.
///
/// Expiry is partition-wide: once [`CACHE_TTL`] has elapsed since the last
/// write, the whole snapshot is discarded on the next read. Mutations
/// (`write_all`, `upsert_one`, `clear`) are serialized by a per-partition
/// lock so an upsert's read-modify-write cannot be interleaved with another.
pub struct CacheStore<T> {
    backend: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    key: &'static str,
    write_lock: Mutex<()>,
    _item: PhantomData<fn() -> T>,
}

impl<T: CatalogItem> CacheStore<T> {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::with_clock(backend, Arc::new(SystemClock))
    }

    pub fn with_clock(backend: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            clock,
            key: T::CACHE_KEY,
            write_lock: Mutex::new(()),
            _item: PhantomData,
        }
    }

    fn is_expired(&self, partition: &CachePartition<T>) -> bool {
        // A snapshot from the future (clock moved back) counts as fresh. A
        // timestamp too far out to compute an age with is treated as expired.
        match self.clock.now_millis().checked_sub(partition.timestamp) {
            Some(age) => age >= CACHE_TTL.as_millis() as i64,
            None => true,
        }
    }

    async fn load(&self) -> Result<Loaded<T>> {
        let raw = match self.backend.get(self.key).await? {
            Some(raw) => raw,
            None => return Ok(Loaded::Missing),
        };

        let partition: CachePartition<T> = match serde_json::from_str(&raw) {
            Ok(partition) => partition,
            Err(e) => return Ok(Loaded::Corrupt(e)),
        };

        if self.is_expired(&partition) {
            Ok(Loaded::Expired)
        } else {
            Ok(Loaded::Fresh(partition))
        }
    }

    async fn store_unlocked(&self, items: Vec<T>) -> Result<usize> {
        let partition = CachePartition {
            items,
            timestamp: self.clock.now_millis(),
        };
        let serialized = serde_json::to_string(&partition).map_err(|e| {
            warn!(key = self.key, error = %e, "Cache partition could not be serialized");
            Error::Cache("Erreur lors de la mise en cache".to_string())
        })?;

        self.backend.set(self.key, serialized).await.map_err(|e| {
            warn!(key = self.key, error = %e, "Cache partition could not be written");
            Error::Cache("Erreur lors de la mise en cache".to_string())
        })?;

        Ok(partition.items.len())
    }

    /// Every cached item, in the order it was written.
    pub async fn read_all(&self) -> Result<Vec<T>> {
        let loaded = self.load().await.map_err(|e| {
            warn!(key = self.key, error = %e, "Cache partition could not be read");
            Error::Cache("Erreur lors de la lecture du cache".to_string())
        })?;

        match loaded {
            Loaded::Fresh(partition) => {
                debug!(key = self.key, items = partition.items.len(), "Cache hit");
                Ok(partition.items)
            }
            Loaded::Missing => Err(Error::Cache("Aucun élément en cache".to_string())),
            Loaded::Corrupt(e) => {
                warn!(key = self.key, error = %e, "Unreadable cache partition");
                Err(Error::Cache("Erreur lors de la lecture du cache".to_string()))
            }
            Loaded::Expired => {
                self.discard_expired().await;
                Err(Error::Cache("Cache expiré".to_string()))
            }
        }
    }

    /// Delete the partition if it is still expired once the lock is held, so a
    /// fresh write landing in between is not thrown away.
    async fn discard_expired(&self) {
        let _guard = self.write_lock.lock().await;
        if let Ok(Loaded::Expired) = self.load().await {
            match self.backend.remove(self.key).await {
                Ok(()) => info!(key = self.key, "Expired cache partition removed"),
                Err(e) => warn!(key = self.key, error = %e, "Failed to remove expired cache partition"),
            }
        }
    }

    /// Replace the whole partition and stamp it with the current time.
    pub async fn write_all(&self, items: Vec<T>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let count = self.store_unlocked(items).await?;
        info!(key = self.key, items = count, "Cache partition written");
        Ok(())
    }

    pub async fn read_by_id(&self, id: &str) -> Result<T> {
        let items = self.read_all().await?;
        items
            .into_iter()
            .find(|item| item.id() == id)
            .ok_or_else(|| Error::Cache(format!("Élément {} non trouvé en cache", id)))
    }

    /// Replace the item with the same id, or append it.
    ///
    /// A missing, expired or unreadable partition is treated as empty. A
    /// failure of the storage medium itself is returned instead of being
    /// treated as empty, a deliberate exception to the store contract, so data
    /// that could not be read is never overwritten.
    pub async fn upsert_one(&self, item: T) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let loaded = self.load().await.map_err(|e| {
            warn!(key = self.key, error = %e, "Cache partition could not be read before upsert");
            Error::Cache("Erreur lors de la mise en cache".to_string())
        })?;

        let mut items = match loaded {
            Loaded::Fresh(partition) => partition.items,
            Loaded::Missing | Loaded::Expired => Vec::new(),
            Loaded::Corrupt(e) => {
                warn!(key = self.key, error = %e, "Replacing unreadable cache partition");
                Vec::new()
            }
        };

        match items.iter().position(|existing| existing.id() == item.id()) {
            Some(index) => items[index] = item,
            None => items.push(item),
        }

        let count = self.store_unlocked(items).await?;
        debug!(key = self.key, items = count, "Cache item upserted");
        Ok(())
    }

    /// Drop the partition. Succeeds when nothing is cached.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.backend.remove(self.key).await.map_err(|e| {
            warn!(key = self.key, error = %e, "Cache partition could not be removed");
            Error::Cache("Erreur lors de la suppression du cache".to_string())
        })?;
        info!(key = self.key, "Cache partition cleared");
        Ok(())
    }
}
