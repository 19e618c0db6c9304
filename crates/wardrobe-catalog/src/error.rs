//! Error types for catalogue operations.

use thiserror::Error;
use wardrobe_store::StoreError;
use wardrobe_types::ImageKey;

/// Errors that abort a catalogue operation.
///
/// Lookup misses are not errors; edits and deletes of unknown ids are
/// no-ops. Metadata save failures are reported as
/// [`PersistNotice`](wardrobe_store::PersistNotice)s instead.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The image could not be written; no record was created.
    #[error("failed to store image {key}: {source}")]
    ImageWriteFailed { key: ImageKey, source: StoreError },

    /// The image could not be deleted; the record was kept.
    #[error("failed to delete image {key}: {source}")]
    ImageDeleteFailed { key: ImageKey, source: StoreError },

    /// No built-in preset has this name.
    #[error("unknown preset: {0}")]
    UnknownPreset(String),

    /// Any other store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Convenience type alias for catalogue operations.
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
