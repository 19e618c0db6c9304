use wardrobe_store::StoreError;

/// Errors from resolving image handles.
///
/// A missing image is not an error; it resolves to no handle.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("image store error: {0}")]
    Store(#[from] StoreError),
}

/// Result alias for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;
