use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::KeyValueStore;

/// Key of the persisted garment collection.
pub const ITEMS_KEY: &str = "wardrobe-ai/items-v2";

/// Key of the persisted outfit collection.
pub const OUTFITS_KEY: &str = "wardrobe-ai/outfits-v1";

/// Whole-collection JSON persistence over a [`KeyValueStore`].
///
/// Each collection is stored as one JSON array under its key. Writes always
/// replace the full array, so callers load, mutate the whole in-memory
/// sequence and save it back.
#[derive(Clone)]
pub struct MetadataStore {
    kv: Arc<dyn KeyValueStore>,
}

impl MetadataStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// Load the collection stored under `name`.
    ///
    /// Returns an empty sequence when nothing is stored, when the backing
    /// store cannot be read, or when the stored text does not parse as an
    /// array of `T`. Corruption is logged, never raised.
    pub fn load_collection<T: DeserializeOwned>(&self, name: &str) -> Vec<T> {
        let raw = match self.kv.get_item(name) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(collection = name, error = %e, "metadata read failed; using empty collection");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(records) => {
                debug!(collection = name, count = records.len(), "collection loaded");
                records
            }
            Err(e) => {
                warn!(collection = name, error = %e, "corrupt collection; using empty collection");
                Vec::new()
            }
        }
    }

    /// Serialize `records` and overwrite the collection stored under `name`.
    pub fn save_collection<T: Serialize>(&self, name: &str, records: &[T]) -> StoreResult<()> {
        let raw =
            serde_json::to_string(records).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.kv.set_item(name, &raw)?;
        debug!(collection = name, count = records.len(), bytes = raw.len(), "collection saved");
        Ok(())
    }

    /// [`save_collection`](Self::save_collection) on the blocking pool.
    ///
    /// File-backed stores fsync and rename on every write; async callers use
    /// this so the runtime's worker threads are never blocked on disk.
    pub async fn persist_collection<T>(&self, name: &str, records: Vec<T>) -> StoreResult<()>
    where
        T: Serialize + Send + 'static,
    {
        let meta = self.clone();
        let name = name.to_string();
        tokio::task::spawn_blocking(move || meta.save_collection(&name, &records))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))?
    }
}

impl fmt::Debug for MetadataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataStore").finish_non_exhaustive()
    }
}

/// A non-fatal persistence failure to show the user.
///
/// The in-memory state that failed to save stays authoritative for the
/// current session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistNotice {
    pub collection: String,
    pub reason: String,
}

impl PersistNotice {
    pub fn new(collection: &str, error: &StoreError) -> Self {
        Self {
            collection: collection.to_string(),
            reason: error.to_string(),
        }
    }
}

impl fmt::Display for PersistNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not save {}: {}", self.collection, self.reason)
    }
}

/// The result of an in-memory mutation plus the outcome of persisting it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Applied<T> {
    pub value: T,
    pub notice: Option<PersistNotice>,
}

impl<T> Applied<T> {
    pub fn saved(value: T) -> Self {
        Self {
            value,
            notice: None,
        }
    }

    pub fn is_saved(&self) -> bool {
        self.notice.is_none()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Applied<U> {
        Applied {
            value: f(self.value),
            notice: self.notice,
        }
    }

    pub fn into_value(self) -> T {
        self.value
    }
}
