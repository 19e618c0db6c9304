use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use tracing::debug;
use wardrobe_store::BinaryStore;
use wardrobe_types::ImageKey;

use crate::error::CacheResult;
use crate::handle::{HandleRegistry, ImageHandle};

/// Maps image keys to display handles, fetching each image once per session.
///
/// Invariants:
/// - at most one live handle per key
/// - a handle is cached under exactly one key
/// - once released, a handle is never returned again; the next resolve
///   fetches afresh and mints a new handle
///
/// Missing images are not cached, so a later resolve can still succeed.
pub struct ImageUrlCache {
    blobs: Arc<dyn BinaryStore>,
    registry: HandleRegistry,
    state: RwLock<CacheState>,
}

#[derive(Default)]
struct CacheState {
    handles: HashMap<ImageKey, ImageHandle>,
    /// Per-key release count; a resolve that sees its key's count move
    /// refetches.
    releases: HashMap<ImageKey, u64>,
    /// Bumped by `clear`, which releases every key at once.
    clears: u64,
}

impl CacheState {
    fn epoch(&self, key: &ImageKey) -> (u64, u64) {
        (self.clears, self.releases.get(key).copied().unwrap_or(0))
    }
}

impl ImageUrlCache {
    pub fn new(blobs: Arc<dyn BinaryStore>) -> Self {
        Self {
            blobs,
            registry: HandleRegistry::new(),
            state: RwLock::new(CacheState::default()),
        }
    }

    /// The handle table backing this cache. Read-only outside this crate:
    ///
    /// ```compile_fail
    /// use std::sync::Arc;
    /// use wardrobe_cache::ImageUrlCache;
    /// use wardrobe_store::InMemoryBinaryStore;
    /// use wardrobe_types::ImageKey;
    ///
    /// let cache = ImageUrlCache::new(Arc::new(InMemoryBinaryStore::new()));
    /// let key = ImageKey::parse("k").unwrap();
    /// if let Some(handle) = cache.cached(&key) {
    ///     cache.registry().revoke(&handle);
    /// }
    /// ```
    pub fn registry(&self) -> &HandleRegistry {
        &self.registry
    }

    /// The cached handle for `key`, without fetching.
    pub fn cached(&self, key: &ImageKey) -> Option<ImageHandle> {
        self.state
            .read()
            .expect("cache lock poisoned")
            .handles
            .get(key)
            .cloned()
    }

    /// Return the handle for `key`, fetching and minting one if needed.
    ///
    /// Returns `Ok(None)` when no image is stored under `key`; the caller
    /// shows a placeholder.
    pub async fn resolve(&self, key: &ImageKey) -> CacheResult<Option<ImageHandle>> {
        loop {
            let epoch = {
                let state = self.state.read().expect("cache lock poisoned");
                if let Some(handle) = state.handles.get(key) {
                    return Ok(Some(handle.clone()));
                }
                state.epoch(key)
            };

            let Some(data) = self.blobs.get(key).await? else {
                debug!(key = %key, "no stored image; not caching");
                return Ok(None);
            };
            let fresh = self.registry.create(data);

            let mut state = self.state.write().expect("cache lock poisoned");
            if let Some(existing) = state.handles.get(key) {
                // Another resolve of this key finished first.
                self.registry.revoke(&fresh);
                return Ok(Some(existing.clone()));
            }
            if state.epoch(key) != epoch {
                // This key was released while we were fetching; the bytes
                // may be stale.
                self.registry.revoke(&fresh);
                continue;
            }
            debug!(key = %key, url = fresh.url(), "image handle created");
            state.handles.insert(key.clone(), fresh.clone());
            return Ok(Some(fresh));
        }
    }

    /// Revoke and forget the handle for `key`. Returns `true` if one existed.
    pub fn release(&self, key: &ImageKey) -> bool {
        let removed = {
            let mut state = self.state.write().expect("cache lock poisoned");
            *state.releases.entry(key.clone()).or_insert(0) += 1;
            state.handles.remove(key)
        };
        match removed {
            Some(handle) => {
                self.registry.revoke(&handle);
                debug!(key = %key, url = handle.url(), "image handle released");
                true
            }
            None => false,
        }
    }

    /// Release every handle. Returns how many were revoked.
    pub fn clear(&self) -> usize {
        let drained: Vec<ImageHandle> = {
            let mut state = self.state.write().expect("cache lock poisoned");
            state.clears += 1;
            state.releases.clear();
            state.handles.drain().map(|(_, h)| h).collect()
        };
        for handle in &drained {
            self.registry.revoke(handle);
        }
        drained.len()
    }

    /// Number of cached handles.
    pub fn len(&self) -> usize {
        self.state.read().expect("cache lock poisoned").handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ImageUrlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageUrlCache")
            .field("handles", &self.len())
            .field("live", &self.registry.live_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use bytes::Bytes;
    use wardrobe_store::{InMemoryBinaryStore, StoreResult};

    /// Counts `get` calls on an in-memory store.
    struct CountingStore {
        inner: InMemoryBinaryStore,
        gets: AtomicUsize,
    }

    #[async_trait]
    impl BinaryStore for CountingStore {
        async fn put(&self, key: &ImageKey, data: Bytes) -> StoreResult<()> {
            self.inner.put(key, data).await
        }

        async fn get(&self, key: &ImageKey) -> StoreResult<Option<Bytes>> {
            self.gets.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn delete(&self, key: &ImageKey) -> StoreResult<bool> {
            self.inner.delete(key).await
        }

        async fn keys(&self) -> StoreResult<Vec<ImageKey>> {
            self.inner.keys().await
        }
    }

    fn key(s: &str) -> ImageKey {
        ImageKey::parse(s).unwrap()
    }

    async fn setup() -> (Arc<CountingStore>, ImageUrlCache) {
        let store = Arc::new(CountingStore {
            inner: InMemoryBinaryStore::new(),
            gets: AtomicUsize::new(0),
        });
        store
            .inner
            .put(&key("k"), Bytes::from_static(b"jpeg"))
            .await
            .unwrap();
        let cache = ImageUrlCache::new(store.clone());
        (store, cache)
    }

    #[tokio::test]
    async fn second_resolve_returns_same_handle_without_fetch() {
        let (store, cache) = setup().await;
        let first = cache.resolve(&key("k")).await.unwrap().unwrap();
        let second = cache.resolve(&key("k")).await.unwrap().unwrap();
        assert_eq!(first, second);
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
        assert_eq!(first.data(), &Bytes::from_static(b"jpeg"));
        assert!(cache.registry().is_live(first.url()));
    }

    #[tokio::test]
    async fn release_then_resolve_fetches_a_new_handle() {
        let (store, cache) = setup().await;
        let first = cache.resolve(&key("k")).await.unwrap().unwrap();
        assert!(cache.release(&key("k")));
        assert!(!cache.registry().is_live(first.url()));

        let second = cache.resolve(&key("k")).await.unwrap().unwrap();
        assert_ne!(first, second);
        assert_eq!(store.gets.load(Ordering::SeqCst), 2);
        assert_eq!(cache.registry().live_count(), 1);
    }

    #[tokio::test]
    async fn missing_image_is_not_cached() {
        let (store, cache) = setup().await;
        assert!(cache.resolve(&key("later")).await.unwrap().is_none());
        assert!(cache.is_empty());

        store
            .inner
            .put(&key("later"), Bytes::from_static(b"png"))
            .await
            .unwrap();
        assert!(cache.resolve(&key("later")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn release_of_unknown_key_is_false() {
        let (_, cache) = setup().await;
        assert!(!cache.release(&key("nope")));
    }

    #[tokio::test]
    async fn distinct_keys_get_distinct_handles() {
        let (store, cache) = setup().await;
        store
            .inner
            .put(&key("k2"), Bytes::from_static(b"jpeg"))
            .await
            .unwrap();
        let a = cache.resolve(&key("k")).await.unwrap().unwrap();
        let b = cache.resolve(&key("k2")).await.unwrap().unwrap();
        assert_ne!(a, b);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_resolves_leave_one_live_handle() {
        let (_, cache) = setup().await;
        let k = key("k");
        let (a, b) = tokio::join!(cache.resolve(&k), cache.resolve(&k));
        let (a, b) = (a.unwrap().unwrap(), b.unwrap().unwrap());
        assert_eq!(a, b);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.registry().live_count(), 1);
    }

    #[tokio::test]
    async fn release_during_fetch_refetches() {
        let (store, cache) = setup().await;
        // The resolve is polled first and suspends in the store; the
        // release then runs before its fetch completes.
        let k = key("k");
        let (resolved, released) = tokio::join!(cache.resolve(&k), async { cache.release(&k) });
        assert!(!released);

        let handle = resolved.unwrap().unwrap();
        assert_eq!(store.gets.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached(&key("k")), Some(handle.clone()));
        assert!(cache.registry().is_live(handle.url()));
        assert_eq!(cache.registry().live_count(), 1);
    }

    #[tokio::test]
    async fn release_of_another_key_during_fetch_keeps_the_fetch() {
        let (store, cache) = setup().await;
        let k = key("k");
        let other = key("other");
        let (resolved, released) =
            tokio::join!(cache.resolve(&k), async { cache.release(&other) });
        assert!(!released);

        let handle = resolved.unwrap().unwrap();
        assert_eq!(store.gets.load(Ordering::SeqCst), 1);
        assert_eq!(cache.cached(&k), Some(handle));
        assert_eq!(cache.registry().live_count(), 1);
    }

    #[tokio::test]
    async fn clear_revokes_everything() {
        let (_, cache) = setup().await;
        let h = cache.resolve(&key("k")).await.unwrap().unwrap();
        assert_eq!(cache.clear(), 1);
        assert!(cache.is_empty());
        assert!(!cache.registry().is_live(h.url()));
    }

    #[tokio::test]
    async fn unavailable_store_is_an_error() {
        let store = Arc::new(InMemoryBinaryStore::new());
        store.set_available(false);
        let cache = ImageUrlCache::new(store);
        assert!(cache.resolve(&key("k")).await.is_err());
    }
}
