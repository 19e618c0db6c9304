use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("config error: {0}")]
    Config(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] wardrobe_catalog::CatalogError),

    #[error("store error: {0}")]
    Store(#[from] wardrobe_store::StoreError),

    #[error("cache error: {0}")]
    Cache(#[from] wardrobe_cache::CacheError),
}

pub type SdkResult<T> = Result<T, SdkError>;
