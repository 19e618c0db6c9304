use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use bytes::Bytes;

/// URL prefix of every handle.
pub const HANDLE_SCHEME: &str = "blob:wardrobe/";

/// A transient, session-scoped reference to image bytes held in memory.
///
/// Two handles are equal only if they carry the same URL.
#[derive(Clone)]
pub struct ImageHandle {
    url: String,
    data: Bytes,
}

impl ImageHandle {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for ImageHandle {}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("url", &self.url)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Table of live handle URLs, the analogue of a browser object-URL table.
///
/// A URL is never reused: every [`create`](Self::create) mints a new one,
/// and a revoked URL no longer resolves. Only the cache mints and revokes;
/// everyone else can look handles up.
#[derive(Debug, Default)]
pub struct HandleRegistry {
    live: RwLock<HashMap<String, Bytes>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new handle for `data`.
    pub(crate) fn create(&self, data: Bytes) -> ImageHandle {
        let url = format!("{HANDLE_SCHEME}{}", uuid::Uuid::now_v7());
        self.live
            .write()
            .expect("registry lock poisoned")
            .insert(url.clone(), data.clone());
        ImageHandle { url, data }
    }

    /// Free a handle. Returns `false` if it was already revoked.
    pub(crate) fn revoke(&self, handle: &ImageHandle) -> bool {
        self.live
            .write()
            .expect("registry lock poisoned")
            .remove(&handle.url)
            .is_some()
    }

    /// Bytes behind a live URL.
    pub fn lookup(&self, url: &str) -> Option<Bytes> {
        self.live
            .read()
            .expect("registry lock poisoned")
            .get(url)
            .cloned()
    }

    pub fn is_live(&self, url: &str) -> bool {
        self.live
            .read()
            .expect("registry lock poisoned")
            .contains_key(url)
    }

    pub fn live_count(&self) -> usize {
        self.live.read().expect("registry lock poisoned").len()
    }
}
