use std::sync::Arc;

use bytes::Bytes;
use tracing::info;
use wardrobe_cache::{ImageHandle, ImageUrlCache};
use wardrobe_catalog::{Catalog, CatalogConfig};
use wardrobe_outfit::Composer;
use wardrobe_store::{
    Applied, BinaryStore, FileKeyValueStore, FsBinaryStore, InMemoryBinaryStore,
    InMemoryKeyValueStore, KeyValueStore, MetadataStore,
};
use wardrobe_types::{Garment, GarmentId};

use crate::config::WardrobeConfig;
use crate::error::SdkResult;

/// High-level wardrobe API.
///
/// The catalogue, composer and cache share one metadata store and one image
/// store. Go through [`Wardrobe::delete_garment`] rather than the catalogue
/// directly so the cached image handle is released too.
pub struct Wardrobe {
    catalog: Arc<Catalog>,
    composer: Composer,
    cache: ImageUrlCache,
}

impl Wardrobe {
    /// Open the file-backed wardrobe described by `config`.
    pub fn open(config: &WardrobeConfig) -> SdkResult<Self> {
        let kv = FileKeyValueStore::open(config.metadata_path())?;
        let blobs = FsBinaryStore::at(config.images_path());
        info!(dir = %config.data_dir.display(), "opening wardrobe");
        Ok(Self::with_stores(Arc::new(kv), Arc::new(blobs), config))
    }

    /// A wardrobe that lives only in memory.
    pub fn in_memory() -> Self {
        Self::with_stores(
            Arc::new(InMemoryKeyValueStore::new()),
            Arc::new(InMemoryBinaryStore::new()),
            &WardrobeConfig::default(),
        )
    }

    /// Assemble a wardrobe over caller-supplied stores.
    pub fn with_stores(
        kv: Arc<dyn KeyValueStore>,
        blobs: Arc<dyn BinaryStore>,
        config: &WardrobeConfig,
    ) -> Self {
        let meta = MetadataStore::new(kv);
        let catalog = Arc::new(
            Catalog::load(meta.clone(), blobs.clone()).with_config(CatalogConfig {
                default_range: config.default_range(),
            }),
        );
        let composer = Composer::load(catalog.clone(), meta);
        let cache = ImageUrlCache::new(blobs);
        Self {
            catalog,
            composer,
            cache,
        }
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    pub fn cache(&self) -> &ImageUrlCache {
        &self.cache
    }

    /// Delete a garment and its image, then drop its cached handle.
    pub async fn delete_garment(&self, id: &GarmentId) -> SdkResult<Applied<Option<Garment>>> {
        let deleted = self.catalog.delete(id).await?;
        if let Some(key) = deleted.value.as_ref().and_then(|g| g.image_key.as_ref()) {
            self.cache.release(key);
        }
        Ok(deleted)
    }

    /// Display handle for a garment's image, or `None` when it has none.
    pub async fn image_handle(&self, id: &GarmentId) -> SdkResult<Option<ImageHandle>> {
        let Some(key) = self.catalog.get(id).and_then(|g| g.image_key) else {
            return Ok(None);
        };
        Ok(self.cache.resolve(&key).await?)
    }

    /// Raw image bytes for a garment, read straight from the image store.
    pub async fn image_bytes(&self, id: &GarmentId) -> SdkResult<Option<Bytes>> {
        let Some(key) = self.catalog.get(id).and_then(|g| g.image_key) else {
            return Ok(None);
        };
        Ok(self.catalog.blobs().get(&key).await?)
    }
}

impl std::fmt::Debug for Wardrobe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wardrobe")
            .field("catalog", &self.catalog)
            .field("composer", &self.composer)
            .field("cache", &self.cache)
            .finish()
    }
}
