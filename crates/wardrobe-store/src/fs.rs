//! Filesystem backends.
//!
//! [`FsBinaryStore`] keeps one file per image under an `images/` directory.
//! [`FileKeyValueStore`] keeps every key in a single JSON document. Both
//! commit writes by writing a temp file in the target directory, syncing it
//! and renaming it into place, so readers never see a partial payload.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use wardrobe_types::ImageKey;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BinaryStore, KeyValueStore};

/// Name of the image collection directory under the data root.
pub const IMAGES_DIR: &str = "images";

/// Write `data` to `target` through a synced temp file in the same directory.
fn commit_file(dir: &Path, target: &Path, data: &[u8]) -> StoreResult<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.as_file().sync_all()?;
    tmp.persist(target).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

fn is_safe_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

/// Encode a key as a portable file name (`%XX` for anything unusual).
fn file_name(key: &ImageKey) -> String {
    let mut out = String::with_capacity(key.as_str().len());
    for b in key.as_str().bytes() {
        if is_safe_byte(b) {
            out.push(b as char);
        } else {
            let _ = write!(out, "%{b:02X}");
        }
    }
    out
}

/// Inverse of [`file_name`]. Returns `None` for foreign files.
fn decode_file_name(name: &str) -> Option<ImageKey> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = name.get(i + 1..i + 3)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b if is_safe_byte(b) => {
                out.push(b);
                i += 1;
            }
            _ => return None,
        }
    }
    ImageKey::parse(String::from_utf8(out).ok()?).ok()
}

fn join_error(e: tokio::task::JoinError) -> StoreError {
    StoreError::Io(io::Error::other(e))
}

// ---------------------------------------------------------------------------
// Binary store
// ---------------------------------------------------------------------------

/// Directory-backed binary store.
///
/// The `images/` directory is created on first use and reused for the
/// lifetime of the store. If creation fails the operation fails with
/// `Unavailable` and the next operation tries again.
pub struct FsBinaryStore {
    path: PathBuf,
    dir: OnceCell<PathBuf>,
}

impl FsBinaryStore {
    /// A store rooted at `<root>/images`. Nothing is touched until first use.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::at(root.into().join(IMAGES_DIR))
    }

    /// A store writing directly into `dir`.
    pub fn at(dir: impl Into<PathBuf>) -> Self {
        Self {
            path: dir.into(),
            dir: OnceCell::new(),
        }
    }

    /// The directory payloads are written to.
    pub fn images_dir(&self) -> PathBuf {
        self.path.clone()
    }

    async fn open(&self) -> StoreResult<&Path> {
        let dir = self
            .dir
            .get_or_try_init(|| async {
                let dir = self.images_dir();
                tokio::fs::create_dir_all(&dir).await.map_err(|e| {
                    StoreError::Unavailable(format!("{}: {e}", dir.display()))
                })?;
                debug!(dir = %dir.display(), "opened image store");
                Ok::<_, StoreError>(dir)
            })
            .await?;
        Ok(dir.as_path())
    }
}

#[async_trait]
impl BinaryStore for FsBinaryStore {
    async fn put(&self, key: &ImageKey, data: Bytes) -> StoreResult<()> {
        let dir = self.open().await?.to_path_buf();
        let target = dir.join(file_name(key));
        let len = data.len();
        tokio::task::spawn_blocking(move || commit_file(&dir, &target, &data))
            .await
            .map_err(join_error)??;
        debug!(key = %key, len, "blob committed");
        Ok(())
    }

    async fn get(&self, key: &ImageKey) -> StoreResult<Option<Bytes>> {
        let path = self.open().await?.join(file_name(key));
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &ImageKey) -> StoreResult<bool> {
        let path = self.open().await?.join(file_name(key));
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = %key, "blob deleted");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn contains(&self, key: &ImageKey) -> StoreResult<bool> {
        let path = self.open().await?.join(file_name(key));
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn keys(&self) -> StoreResult<Vec<ImageKey>> {
        let dir = self.open().await?;
        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(key) = entry.file_name().to_str().and_then(decode_file_name) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for FsBinaryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FsBinaryStore")
            .field("dir", &self.images_dir())
            .field("opened", &self.dir.initialized())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Key/value store
// ---------------------------------------------------------------------------

/// Key/value store persisted as one JSON object file.
///
/// The whole document is held in memory and rewritten on every change. A
/// failed write leaves both the file and the in-memory copy untouched.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    items: RwLock<BTreeMap<String, String>>,
}

impl FileKeyValueStore {
    /// Open the document at `path`, creating its directory if needed.
    ///
    /// A missing file opens empty; an unreadable document is logged and
    /// treated as empty.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        std::fs::create_dir_all(parent_dir(&path))
            .map_err(|e| StoreError::Unavailable(format!("{}: {e}", path.display())))?;

        let items = match std::fs::read(&path) {
            Ok(raw) => serde_json::from_slice(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "corrupt metadata file; starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_document(&self, items: &BTreeMap<String, String>) -> StoreResult<()> {
        let data = serde_json::to_vec_pretty(items)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        commit_file(parent_dir(&self.path), &self.path, &data)
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self.items.read().expect("lock poisoned").get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut items = self.items.write().expect("lock poisoned");
        let mut next = items.clone();
        next.insert(key.to_string(), value.to_string());
        self.write_document(&next)?;
        *items = next;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<bool> {
        let mut items = self.items.write().expect("lock poisoned");
        if !items.contains_key(key) {
            return Ok(false);
        }
        let mut next = items.clone();
        next.remove(key);
        self.write_document(&next)?;
        *items = next;
        Ok(true)
    }
}
