use async_trait::async_trait;
use bytes::Bytes;
use wardrobe_types::ImageKey;

use crate::error::StoreResult;

/// Transactional key -> blob store for garment images.
///
/// All implementations must satisfy these invariants:
/// - `put` resolves only once the write has committed, never merely after
///   the write call was issued.
/// - A missing key is reported as `None` / `false`, never as an error.
/// - The store never interprets payloads.
/// - Failure to open the backing storage surfaces as
///   [`StoreError::Unavailable`](crate::StoreError::Unavailable).
#[async_trait]
pub trait BinaryStore: Send + Sync {
    /// Insert or overwrite the payload at `key`.
    async fn put(&self, key: &ImageKey, data: Bytes) -> StoreResult<()>;

    /// Read the payload at `key`. Returns `Ok(None)` if it does not exist.
    async fn get(&self, key: &ImageKey) -> StoreResult<Option<Bytes>>;

    /// Remove the payload at `key`. Returns `true` if it existed.
    ///
    /// Deleting a missing key is a no-op.
    async fn delete(&self, key: &ImageKey) -> StoreResult<bool>;

    /// Check whether a payload exists at `key`.
    async fn contains(&self, key: &ImageKey) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// All keys currently stored, sorted.
    async fn keys(&self) -> StoreResult<Vec<ImageKey>>;
}

/// Textual key -> string store in the style of browser local storage.
///
/// Operations are synchronous and atomic per key.
pub trait KeyValueStore: Send + Sync {
    /// Returns `Ok(None)` if nothing is stored at `key`.
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Store `value` at `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`. Returns `true` if it existed.
    fn remove_item(&self, key: &str) -> StoreResult<bool>;
}
