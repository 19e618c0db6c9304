//! Image display handles for the wardrobe.
//!
//! Stored images are addressed by [`ImageKey`](wardrobe_types::ImageKey).
//! To show one, a renderer needs a transient handle: a `blob:` URL backed by
//! the image bytes held in memory. The [`ImageUrlCache`] creates at most one
//! handle per key per session and is the only place handles are revoked.

pub mod cache;
pub mod error;
pub mod handle;

pub use cache::ImageUrlCache;
pub use error::{CacheError, CacheResult};
pub use handle::{HandleRegistry, ImageHandle, HANDLE_SCHEME};
