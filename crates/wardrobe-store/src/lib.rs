//! Local persistence for the wardrobe catalogue.
//!
//! Structured metadata and binary image payloads live in two separate
//! stores so large images never inflate the textual store:
//!
//! - [`BinaryStore`] -- transactional key -> blob store for garment photos
//! - [`KeyValueStore`] -- textual key -> string store, wrapped by
//!   [`MetadataStore`] which reads and writes whole JSON collections
//!
//! # Backends
//!
//! - [`InMemoryBinaryStore`] / [`InMemoryKeyValueStore`] -- for tests and
//!   ephemeral sessions
//! - [`FsBinaryStore`] / [`FileKeyValueStore`] -- directory and file backed
//!
//! # Rules
//!
//! 1. A binary `put` resolves only after the payload is durably committed.
//! 2. Reading or deleting a missing key is never an error.
//! 3. Corrupt metadata loads as an empty collection.
//! 4. Metadata writes replace a whole collection at once.

pub mod error;
pub mod fs;
pub mod memory;
pub mod metadata;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::{FileKeyValueStore, FsBinaryStore, IMAGES_DIR};
pub use memory::{InMemoryBinaryStore, InMemoryKeyValueStore};
pub use metadata::{Applied, MetadataStore, PersistNotice, ITEMS_KEY, OUTFITS_KEY};
pub use traits::{BinaryStore, KeyValueStore};
