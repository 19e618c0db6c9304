//! The [`Catalog`]: single owner of the garment collection.
//!
//! Structural changes are applied to the in-memory collection synchronously,
//! with no await point between reading and writing it, so two quick
//! mutations can never both start from the same snapshot. Persistence then
//! goes through one save gate; the snapshot written is taken while holding
//! the gate, so the last save to finish always carries the latest state.

use std::sync::{Arc, RwLock};

use bytes::Bytes;
use tracing::{debug, info, warn};
use wardrobe_store::{Applied, BinaryStore, MetadataStore, PersistNotice, ITEMS_KEY};
use wardrobe_types::{
    Category, CategoryFilter, Clock, Garment, GarmentEdit, GarmentId, IdGenerator, ImageKey,
    SystemClock, TempRange, UuidV7Generator, DEFAULT_NAME,
};

use crate::error::{CatalogError, CatalogResult};
use crate::preset::Preset;

/// Defaults applied to newly added garments.
#[derive(Clone, Debug, Default)]
pub struct CatalogConfig {
    /// Temperature range given to garments added from a photo.
    pub default_range: TempRange,
}

/// In-memory garment collection backed by a metadata store and an image store.
///
/// The collection is ordered newest-first: adds prepend.
pub struct Catalog {
    garments: RwLock<Vec<Garment>>,
    save_gate: tokio::sync::Mutex<()>,
    /// Shared by adds and deletes across their image and record steps;
    /// taken exclusively by repair.
    blob_gate: tokio::sync::RwLock<()>,
    meta: MetadataStore,
    blobs: Arc<dyn BinaryStore>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
    config: CatalogConfig,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("garments", &self.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Catalog {
    /// Load the persisted collection. Missing or corrupt data loads empty.
    pub fn load(meta: MetadataStore, blobs: Arc<dyn BinaryStore>) -> Self {
        let garments: Vec<Garment> = meta
            .load_collection::<Garment>(ITEMS_KEY)
            .into_iter()
            .map(Garment::normalized)
            .collect();
        debug!(count = garments.len(), "catalog loaded");
        Self {
            garments: RwLock::new(garments),
            save_gate: tokio::sync::Mutex::new(()),
            blob_gate: tokio::sync::RwLock::new(()),
            meta,
            blobs,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidV7Generator),
            config: CatalogConfig::default(),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_config(mut self, config: CatalogConfig) -> Self {
        self.config = config;
        self
    }

    /// The image store this catalogue writes to.
    pub fn blobs(&self) -> &Arc<dyn BinaryStore> {
        &self.blobs
    }

    // ---- Reads ----

    /// Snapshot of the whole collection, newest first.
    pub fn garments(&self) -> Vec<Garment> {
        self.garments.read().expect("catalog lock poisoned").clone()
    }

    pub fn get(&self, id: &GarmentId) -> Option<Garment> {
        self.garments
            .read()
            .expect("catalog lock poisoned")
            .iter()
            .find(|g| &g.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.garments.read().expect("catalog lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Garments matching `filter`, in collection order.
    pub fn filter(&self, filter: CategoryFilter) -> Vec<Garment> {
        self.garments
            .read()
            .expect("catalog lock poisoned")
            .iter()
            .filter(|g| filter.matches(g.category))
            .cloned()
            .collect()
    }

    // ---- Mutations ----

    /// Store `image` and create a garment with default name and range.
    ///
    /// If the image cannot be written no record is created.
    pub async fn add_from_image(
        &self,
        category: Category,
        image: Bytes,
    ) -> CatalogResult<Applied<Garment>> {
        self.add(DEFAULT_NAME, category, self.config.default_range, image)
            .await
    }

    /// Create a garment from a preset with a synthesized placeholder image.
    pub async fn add_preset(&self, preset: &Preset) -> CatalogResult<Applied<Garment>> {
        self.add(
            &preset.name,
            preset.category,
            preset.temp_range,
            preset.render_placeholder(),
        )
        .await
    }

    /// Add the built-in preset called `name` (case-insensitive).
    pub async fn add_preset_named(&self, name: &str) -> CatalogResult<Applied<Garment>> {
        let preset =
            Preset::find(name).ok_or_else(|| CatalogError::UnknownPreset(name.to_string()))?;
        self.add_preset(&preset).await
    }

    async fn add(
        &self,
        name: &str,
        category: Category,
        range: TempRange,
        image: Bytes,
    ) -> CatalogResult<Applied<Garment>> {
        let _writing = self.blob_gate.read().await;
        let key = ImageKey::generate(self.ids.as_ref());
        self.blobs
            .put(&key, image)
            .await
            .map_err(|source| CatalogError::ImageWriteFailed {
                key: key.clone(),
                source,
            })?;

        let garment = Garment::new(
            GarmentId::generate(self.ids.as_ref()),
            name,
            category,
            range,
            Some(key),
            self.clock.now_ms(),
        );
        self.garments
            .write()
            .expect("catalog lock poisoned")
            .insert(0, garment.clone());
        info!(id = %garment.id, category = %garment.category, "garment added");

        let notice = self.persist().await;
        Ok(Applied {
            value: garment,
            notice,
        })
    }

    /// Edit name, category and temperature range.
    ///
    /// Unknown ids are ignored: the result carries `None` and nothing is saved.
    pub async fn edit(&self, id: &GarmentId, edit: &GarmentEdit) -> Applied<Option<Garment>> {
        let updated = {
            let mut garments = self.garments.write().expect("catalog lock poisoned");
            garments.iter_mut().find(|g| &g.id == id).map(|g| {
                g.apply(edit);
                g.clone()
            })
        };
        let Some(garment) = updated else {
            debug!(id = %id, "edit of unknown garment ignored");
            return Applied::saved(None);
        };
        info!(id = %garment.id, "garment edited");

        let notice = self.persist().await;
        Applied {
            value: Some(garment),
            notice,
        }
    }

    /// Delete a garment and its image.
    ///
    /// The image goes first. If that fails the whole delete is aborted and
    /// the record kept, so a record never points at a deleted image by our
    /// own doing. Unknown ids are ignored.
    pub async fn delete(&self, id: &GarmentId) -> CatalogResult<Applied<Option<Garment>>> {
        let Some(garment) = self.get(id) else {
            debug!(id = %id, "delete of unknown garment ignored");
            return Ok(Applied::saved(None));
        };

        let _writing = self.blob_gate.read().await;
        if let Some(key) = &garment.image_key {
            self.blobs
                .delete(key)
                .await
                .map_err(|source| CatalogError::ImageDeleteFailed {
                    key: key.clone(),
                    source,
                })?;
        }

        let removed = {
            let mut garments = self.garments.write().expect("catalog lock poisoned");
            garments
                .iter()
                .position(|g| &g.id == id)
                .map(|pos| garments.remove(pos))
        };
        let Some(removed) = removed else {
            // Removed by a concurrent delete while the image was going away.
            return Ok(Applied::saved(None));
        };
        info!(id = %removed.id, "garment deleted");

        let notice = self.persist().await;
        Ok(Applied {
            value: Some(removed),
            notice,
        })
    }

    /// Clear the image key of each listed garment. Returns how many changed.
    pub(crate) fn detach_images(&self, ids: &[GarmentId]) -> usize {
        let mut garments = self.garments.write().expect("catalog lock poisoned");
        let mut changed = 0;
        for g in garments.iter_mut().filter(|g| ids.contains(&g.id)) {
            if g.image_key.take().is_some() {
                changed += 1;
            }
        }
        changed
    }

    /// Wait for in-flight adds and deletes, then hold them off.
    pub(crate) async fn exclusive(&self) -> tokio::sync::RwLockWriteGuard<'_, ()> {
        self.blob_gate.write().await
    }

    /// Save the current collection through the save gate.
    pub(crate) async fn persist(&self) -> Option<PersistNotice> {
        let _gate = self.save_gate.lock().await;
        let snapshot = self.garments();
        match self.meta.persist_collection(ITEMS_KEY, snapshot).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "garment collection not saved; keeping in-memory state");
                Some(PersistNotice::new(ITEMS_KEY, &e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use wardrobe_store::{InMemoryBinaryStore, InMemoryKeyValueStore, KeyValueStore};
    use wardrobe_types::{ManualClock, SequentialIds, UNTITLED_NAME};

    struct Fixture {
        kv: Arc<InMemoryKeyValueStore>,
        blobs: Arc<InMemoryBinaryStore>,
        clock: Arc<ManualClock>,
        catalog: Catalog,
    }

    fn fixture_with_kv(kv: InMemoryKeyValueStore) -> Fixture {
        let kv = Arc::new(kv);
        let blobs = Arc::new(InMemoryBinaryStore::new());
        let clock = Arc::new(ManualClock::new(1_000));
        let catalog = Catalog::load(MetadataStore::new(kv.clone()), blobs.clone())
            .with_clock(clock.clone())
            .with_ids(Arc::new(SequentialIds::new("id")));
        Fixture {
            kv,
            blobs,
            clock,
            catalog,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_kv(InMemoryKeyValueStore::new())
    }

    fn persisted(f: &Fixture) -> Vec<Garment> {
        MetadataStore::new(f.kv.clone()).load_collection(ITEMS_KEY)
    }

    fn photo() -> Bytes {
        Bytes::from_static(b"\xff\xd8\xff\xe0jpeg")
    }

    // -----------------------------------------------------------------------
    // Add
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn add_from_image_writes_blob_then_record() {
        let f = fixture();
        let added = f.catalog.add_from_image(Category::Top, photo()).await.unwrap();
        assert!(added.is_saved());

        let g = added.value;
        assert_eq!(g.name, DEFAULT_NAME);
        assert_eq!(g.category, Category::Top);
        assert_eq!(g.temp_range(), TempRange::default());
        assert_eq!(g.created_at, 1_000);

        let key = g.image_key.clone().unwrap();
        assert_eq!(f.blobs.get(&key).await.unwrap(), Some(photo()));
        assert_eq!(persisted(&f), vec![g]);
    }

    #[tokio::test]
    async fn adds_prepend_newest_first() {
        let f = fixture();
        let a = f.catalog.add_from_image(Category::Top, photo()).await.unwrap().value;
        f.clock.advance(10);
        let b = f.catalog.add_from_image(Category::Shoes, photo()).await.unwrap().value;

        let ids: Vec<_> = f.catalog.garments().into_iter().map(|g| g.id).collect();
        assert_eq!(ids, vec![b.id.clone(), a.id.clone()]);
        let stored: Vec<_> = persisted(&f).into_iter().map(|g| g.id).collect();
        assert_eq!(stored, vec![b.id, a.id]);
    }

    #[tokio::test]
    async fn failed_image_write_creates_no_record() {
        let f = fixture();
        f.blobs.set_available(false);
        let err = f.catalog.add_from_image(Category::Top, photo()).await.unwrap_err();
        assert!(matches!(err, CatalogError::ImageWriteFailed { .. }));
        assert!(f.catalog.is_empty());
        assert!(persisted(&f).is_empty());
    }

    #[tokio::test]
    async fn add_preset_stores_placeholder() {
        let f = fixture();
        let preset = Preset::find("Down jacket").unwrap();
        let g = f.catalog.add_preset(&preset).await.unwrap().value;
        assert_eq!(g.name, "Down jacket");
        assert_eq!(g.category, Category::Outer);
        assert_eq!((g.temp_min, g.temp_max), (-15, 5));

        let svg = f.blobs.get(g.image_key.as_ref().unwrap()).await.unwrap().unwrap();
        assert_eq!(svg, preset.render_placeholder());
    }

    #[tokio::test]
    async fn add_preset_named_rejects_unknown_names() {
        let f = fixture();
        let g = f.catalog.add_preset_named("sun HAT").await.unwrap().value;
        assert_eq!(g.name, "Sun hat");

        let err = f.catalog.add_preset_named("ball gown").await.unwrap_err();
        assert!(matches!(err, CatalogError::UnknownPreset(name) if name == "ball gown"));
        assert!(f.blobs.len() == 1 && f.catalog.len() == 1);
    }

    #[tokio::test]
    async fn add_survives_persist_failure() {
        let f = fixture_with_kv(InMemoryKeyValueStore::with_quota(16));
        let added = f.catalog.add_from_image(Category::Top, photo()).await.unwrap();
        let notice = added.notice.expect("quota should fail the save");
        assert_eq!(notice.collection, ITEMS_KEY);
        assert_eq!(f.catalog.len(), 1);
        assert!(f.kv.get_item(ITEMS_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn interleaved_adds_both_land_and_persist() {
        let f = fixture();
        let (a, b) = tokio::join!(
            f.catalog.add_from_image(Category::Top, photo()),
            f.catalog.add_from_image(Category::Bottom, photo()),
        );
        let (a, b) = (a.unwrap().value, b.unwrap().value);
        assert_eq!(f.catalog.len(), 2);

        let stored: HashSet<_> = persisted(&f).into_iter().map(|g| g.id).collect();
        assert_eq!(stored, HashSet::from([a.id, b.id]));
        assert_eq!(f.blobs.len(), 2);
    }

    // -----------------------------------------------------------------------
    // Edit
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn edit_normalizes_and_persists() {
        let f = fixture();
        let g = f.catalog.add_from_image(Category::Top, photo()).await.unwrap().value;

        let edit = GarmentEdit {
            name: "  ".into(),
            category: Category::Outer,
            temp_min: 18,
            temp_max: 4,
        };
        let edited = f.catalog.edit(&g.id, &edit).await.value.unwrap();
        assert_eq!(edited.name, UNTITLED_NAME);
        assert_eq!(edited.category, Category::Outer);
        assert_eq!((edited.temp_min, edited.temp_max), (4, 18));
        assert_eq!(edited.image_key, g.image_key);
        assert_eq!(edited.created_at, g.created_at);
        assert_eq!(persisted(&f), vec![edited]);
    }

    #[tokio::test]
    async fn edit_unknown_id_is_a_no_op() {
        let f = fixture();
        let g = f.catalog.add_from_image(Category::Top, photo()).await.unwrap().value;
        let before = f.kv.get_item(ITEMS_KEY).unwrap();

        let ghost = GarmentId::parse("ghost").unwrap();
        let result = f.catalog.edit(&ghost, &GarmentEdit::from_garment(&g)).await;
        assert!(result.value.is_none());
        assert!(result.is_saved());
        assert_eq!(f.kv.get_item(ITEMS_KEY).unwrap(), before);
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn delete_removes_blob_and_record() {
        let f = fixture();
        let g = f.catalog.add_from_image(Category::Top, photo()).await.unwrap().value;
        let key = g.image_key.clone().unwrap();

        let removed = f.catalog.delete(&g.id).await.unwrap().value.unwrap();
        assert_eq!(removed.id, g.id);
        assert!(f.blobs.get(&key).await.unwrap().is_none());
        assert!(f.catalog.is_empty());
        assert!(persisted(&f).is_empty());
    }

    #[tokio::test]
    async fn delete_unknown_id_is_a_no_op() {
        let f = fixture();
        let ghost = GarmentId::parse("ghost").unwrap();
        assert!(f.catalog.delete(&ghost).await.unwrap().value.is_none());
    }

    #[tokio::test]
    async fn failed_blob_delete_keeps_record() {
        let f = fixture();
        let g = f.catalog.add_from_image(Category::Top, photo()).await.unwrap().value;
        f.blobs.set_available(false);

        let err = f.catalog.delete(&g.id).await.unwrap_err();
        assert!(matches!(err, CatalogError::ImageDeleteFailed { .. }));
        assert_eq!(f.catalog.get(&g.id), Some(g.clone()));

        f.blobs.set_available(true);
        assert!(f.blobs.contains(g.image_key.as_ref().unwrap()).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_deletes_remove_once() {
        let f = fixture();
        let g = f.catalog.add_from_image(Category::Top, photo()).await.unwrap().value;
        let (a, b) = tokio::join!(f.catalog.delete(&g.id), f.catalog.delete(&g.id));
        let removed = [a.unwrap().value, b.unwrap().value]
            .into_iter()
            .flatten()
            .count();
        assert_eq!(removed, 1);
        assert!(f.catalog.is_empty());
    }

    // -----------------------------------------------------------------------
    // Filter and load
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn filter_by_category_and_all() {
        let f = fixture();
        for c in [Category::Top, Category::Bottom, Category::Top] {
            f.catalog.add_from_image(c, photo()).await.unwrap();
        }
        let all = f.catalog.filter(CategoryFilter::All);
        assert_eq!(all, f.catalog.garments());
        let tops = f.catalog.filter(CategoryFilter::Only(Category::Top));
        assert_eq!(tops.len(), 2);
        assert!(tops.iter().all(|g| g.category == Category::Top));
        assert!(f.catalog.filter(Category::Shoes.into()).is_empty());
    }

    #[tokio::test]
    async fn reload_sees_saved_state() {
        let f = fixture();
        let g = f.catalog.add_from_image(Category::Top, photo()).await.unwrap().value;
        let reloaded = Catalog::load(MetadataStore::new(f.kv.clone()), f.blobs.clone());
        assert_eq!(reloaded.garments(), vec![g]);
    }

    #[test]
    fn corrupt_collection_loads_empty() {
        let kv = InMemoryKeyValueStore::new();
        kv.set_item(ITEMS_KEY, "[{\"id\":").unwrap();
        let f = fixture_with_kv(kv);
        assert!(f.catalog.is_empty());
    }

    #[test]
    fn loaded_records_are_normalized() {
        let kv = InMemoryKeyValueStore::new();
        kv.set_item(
            ITEMS_KEY,
            r#"[{"id":"x","name":" ","category":"top","tempMin":30,"tempMax":1,"createdAt":1}]"#,
        )
        .unwrap();
        let f = fixture_with_kv(kv);
        let g = &f.catalog.garments()[0];
        assert_eq!(g.name, UNTITLED_NAME);
        assert_eq!((g.temp_min, g.temp_max), (1, 30));
    }
}
