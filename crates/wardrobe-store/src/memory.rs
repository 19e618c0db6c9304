use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use wardrobe_types::ImageKey;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BinaryStore, KeyValueStore};

/// In-memory, HashMap-based binary store.
///
/// Intended for tests and ephemeral sessions. Every operation yields to the
/// scheduler once before touching the map, so callers observe the same
/// suspension points as with a real backend. The store can be switched into
/// an unavailable mode to exercise open-failure paths.
pub struct InMemoryBinaryStore {
    blobs: RwLock<HashMap<ImageKey, Bytes>>,
    available: AtomicBool,
}

impl InMemoryBinaryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Make every subsequent operation fail with `Unavailable` (or recover).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of payloads currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.blobs.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored payloads.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .expect("lock poisoned")
            .values()
            .map(|b| b.len() as u64)
            .sum()
    }

    async fn open(&self) -> StoreResult<()> {
        tokio::task::yield_now().await;
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("in-memory store disabled".into()))
        }
    }
}

impl Default for InMemoryBinaryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BinaryStore for InMemoryBinaryStore {
    async fn put(&self, key: &ImageKey, data: Bytes) -> StoreResult<()> {
        self.open().await?;
        debug!(key = %key, len = data.len(), "blob put");
        self.blobs
            .write()
            .expect("lock poisoned")
            .insert(key.clone(), data);
        Ok(())
    }

    async fn get(&self, key: &ImageKey) -> StoreResult<Option<Bytes>> {
        self.open().await?;
        Ok(self.blobs.read().expect("lock poisoned").get(key).cloned())
    }

    async fn delete(&self, key: &ImageKey) -> StoreResult<bool> {
        self.open().await?;
        let existed = self
            .blobs
            .write()
            .expect("lock poisoned")
            .remove(key)
            .is_some();
        debug!(key = %key, existed, "blob delete");
        Ok(existed)
    }

    async fn keys(&self) -> StoreResult<Vec<ImageKey>> {
        self.open().await?;
        let mut keys: Vec<ImageKey> = self
            .blobs
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for InMemoryBinaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBinaryStore")
            .field("blob_count", &self.len())
            .field("available", &self.available.load(Ordering::SeqCst))
            .finish()
    }
}

/// In-memory key/value store with an optional byte quota.
///
/// The quota counts key and value lengths across all entries, so a write
/// that would grow the store past it fails with `QuotaExceeded` and leaves
/// the previous value in place.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    items: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: RwLock::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    fn usage_without(items: &HashMap<String, String>, key: &str) -> usize {
        items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.read().expect("lock poisoned").get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut items = self.items.write().expect("lock poisoned");
        if let Some(quota) = self.quota {
            let needed = Self::usage_without(&items, key) + key.len() + value.len();
            if needed > quota {
                return Err(StoreError::QuotaExceeded { needed, quota });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<bool> {
        Ok(self
            .items
            .write()
            .expect("lock poisoned")
            .remove(key)
            .is_some())
    }
}
