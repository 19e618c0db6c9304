use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};
use wardrobe_catalog::Catalog;
use wardrobe_store::{Applied, MetadataStore, PersistNotice, OUTFITS_KEY};
use wardrobe_types::{
    Category, Clock, Garment, GarmentId, IdGenerator, Outfit, OutfitId, Selection, SystemClock,
    UuidV7Generator,
};

/// One filled slot of an outfit, looked up against the live catalogue.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedSlot {
    pub slot: Category,
    pub garment_id: GarmentId,
    /// `None` when the garment has since been deleted.
    pub garment: Option<Garment>,
}

/// Per-slot selection state plus committed outfit history.
///
/// Selections are not checked against the garment's own category; callers
/// offer choices from [`Composer::list_candidates`].
pub struct Composer {
    catalog: Arc<Catalog>,
    selection: RwLock<Selection>,
    outfits: RwLock<Vec<Outfit>>,
    save_gate: tokio::sync::Mutex<()>,
    meta: MetadataStore,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl std::fmt::Debug for Composer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composer")
            .field("selection", &self.selection())
            .field("outfits", &self.outfits.read().expect("outfit lock poisoned").len())
            .finish()
    }
}

impl Composer {
    /// Load outfit history. Missing or corrupt data loads empty.
    pub fn load(catalog: Arc<Catalog>, meta: MetadataStore) -> Self {
        let outfits: Vec<Outfit> = meta.load_collection(OUTFITS_KEY);
        debug!(count = outfits.len(), "outfits loaded");
        Self {
            catalog,
            selection: RwLock::new(Selection::new()),
            outfits: RwLock::new(outfits),
            save_gate: tokio::sync::Mutex::new(()),
            meta,
            clock: Arc::new(SystemClock),
            ids: Arc::new(UuidV7Generator),
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

    // ---- Selection ----

    /// Set or clear one slot. Returns the previous choice.
    pub fn select_slot(&self, slot: Category, garment: Option<GarmentId>) -> Option<GarmentId> {
        self.selection
            .write()
            .expect("selection lock poisoned")
            .set(slot, garment)
    }

    /// Copy of the in-progress selection.
    pub fn selection(&self) -> Selection {
        self.selection.read().expect("selection lock poisoned").clone()
    }

    /// Empty every slot.
    pub fn clear_selection(&self) {
        *self.selection.write().expect("selection lock poisoned") = Selection::new();
    }

    /// Garments of `slot`, most recently added first.
    pub fn list_candidates(&self, slot: Category) -> Vec<Garment> {
        let mut candidates = self.catalog.filter(slot.into());
        candidates.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        candidates
    }

    // ---- History ----

    /// Snapshot the current selection as a new outfit.
    ///
    /// The selection is left as it is, so near-identical outfits can be
    /// saved back to back.
    pub async fn commit(&self) -> Applied<Outfit> {
        let outfit = Outfit {
            id: OutfitId::generate(self.ids.as_ref()),
            created_at: self.clock.now_ms(),
            selection: self.selection(),
        };
        self.outfits
            .write()
            .expect("outfit lock poisoned")
            .insert(0, outfit.clone());
        info!(id = %outfit.id, slots = outfit.selection.len(), "outfit committed");

        let notice = self.persist().await;
        Applied {
            value: outfit,
            notice,
        }
    }

    /// Committed outfits, newest first.
    pub fn outfits(&self) -> Vec<Outfit> {
        self.outfits.read().expect("outfit lock poisoned").clone()
    }

    pub fn get(&self, id: &OutfitId) -> Option<Outfit> {
        self.outfits
            .read()
            .expect("outfit lock poisoned")
            .iter()
            .find(|o| &o.id == id)
            .cloned()
    }

    /// Look up each filled slot of `outfit` in the catalogue.
    pub fn resolve(&self, outfit: &Outfit) -> Vec<ResolvedSlot> {
        outfit
            .selection
            .iter()
            .map(|(slot, id)| ResolvedSlot {
                slot,
                garment_id: id.clone(),
                garment: self.catalog.get(id),
            })
            .collect()
    }

    async fn persist(&self) -> Option<PersistNotice> {
        let _gate = self.save_gate.lock().await;
        let snapshot = self.outfits();
        match self.meta.persist_collection(OUTFITS_KEY, snapshot).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "outfit history not saved; keeping in-memory state");
                Some(PersistNotice::new(OUTFITS_KEY, &e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use wardrobe_store::{InMemoryBinaryStore, InMemoryKeyValueStore, KeyValueStore};
    use wardrobe_types::{ManualClock, SequentialIds};

    struct Fixture {
        kv: Arc<InMemoryKeyValueStore>,
        clock: Arc<ManualClock>,
        catalog: Arc<Catalog>,
        composer: Composer,
    }

    fn fixture_with_kv(kv: InMemoryKeyValueStore) -> Fixture {
        let kv = Arc::new(kv);
        let clock = Arc::new(ManualClock::new(100));
        let ids = Arc::new(SequentialIds::new("x"));
        let catalog = Arc::new(
            Catalog::load(
                MetadataStore::new(kv.clone()),
                Arc::new(InMemoryBinaryStore::new()),
            )
            .with_clock(clock.clone())
            .with_ids(ids.clone()),
        );
        let composer = Composer::load(catalog.clone(), MetadataStore::new(kv.clone()))
            .with_clock(clock.clone())
            .with_ids(ids);
        Fixture {
            kv,
            clock,
            catalog,
            composer,
        }
    }

    fn fixture() -> Fixture {
        fixture_with_kv(InMemoryKeyValueStore::new())
    }

    async fn add(f: &Fixture, c: Category) -> Garment {
        f.clock.advance(1);
        f.catalog
            .add_from_image(c, Bytes::from_static(b"img"))
            .await
            .unwrap()
            .value
    }

    #[tokio::test]
    async fn commit_snapshots_selection_and_keeps_it() {
        let f = fixture();
        let a = add(&f, Category::Top).await;
        let b = add(&f, Category::Bottom).await;
        f.composer.select_slot(Category::Top, Some(a.id.clone()));
        f.composer.select_slot(Category::Bottom, Some(b.id.clone()));
        f.composer.select_slot(Category::Shoes, None);

        let outfit = f.composer.commit().await;
        assert!(outfit.is_saved());
        let outfit = outfit.value;
        assert_eq!(outfit.selection.get(Category::Top), Some(&a.id));
        assert_eq!(outfit.selection.get(Category::Bottom), Some(&b.id));
        for slot in [Category::Inner, Category::Outer, Category::Shoes, Category::Accessory] {
            assert!(outfit.selection.get(slot).is_none());
        }

        let still = f.composer.selection();
        assert_eq!(still.get(Category::Top), Some(&a.id));
        assert_eq!(still.get(Category::Bottom), Some(&b.id));
    }

    #[tokio::test]
    async fn history_is_newest_first_and_persisted() {
        let f = fixture();
        let first = f.composer.commit().await.value;
        f.clock.advance(5);
        let second = f.composer.commit().await.value;
        assert_ne!(first.id, second.id);
        assert_eq!(f.composer.outfits(), vec![second.clone(), first.clone()]);

        let saved: Vec<Outfit> = MetadataStore::new(f.kv.clone()).load_collection(OUTFITS_KEY);
        assert_eq!(saved, vec![second, first]);
    }

    #[tokio::test]
    async fn later_edits_do_not_touch_committed_outfits() {
        let f = fixture();
        let a = add(&f, Category::Top).await;
        f.composer.select_slot(Category::Top, Some(a.id.clone()));
        let outfit = f.composer.commit().await.value;

        f.composer.select_slot(Category::Top, None);
        assert_eq!(f.composer.get(&outfit.id).unwrap().selection.get(Category::Top), Some(&a.id));
    }

    #[tokio::test]
    async fn candidates_are_filtered_and_most_recent_first() {
        let f = fixture();
        let old = add(&f, Category::Shoes).await;
        add(&f, Category::Top).await;
        let new = add(&f, Category::Shoes).await;

        let ids: Vec<_> = f
            .composer
            .list_candidates(Category::Shoes)
            .into_iter()
            .map(|g| g.id)
            .collect();
        assert_eq!(ids, vec![new.id, old.id]);
        assert!(f.composer.list_candidates(Category::Accessory).is_empty());
    }

    #[tokio::test]
    async fn selection_accepts_any_garment_id() {
        let f = fixture();
        let top = add(&f, Category::Top).await;
        f.composer.select_slot(Category::Shoes, Some(top.id.clone()));
        assert_eq!(f.composer.selection().get(Category::Shoes), Some(&top.id));
    }

    #[tokio::test]
    async fn resolve_marks_deleted_garments() {
        let f = fixture();
        let a = add(&f, Category::Top).await;
        let b = add(&f, Category::Bottom).await;
        f.composer.select_slot(Category::Top, Some(a.id.clone()));
        f.composer.select_slot(Category::Bottom, Some(b.id.clone()));
        let outfit = f.composer.commit().await.value;

        f.catalog.delete(&a.id).await.unwrap();
        let resolved = f.composer.resolve(&outfit);
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].slot, Category::Top);
        assert!(resolved[0].garment.is_none());
        assert_eq!(resolved[1].garment.as_ref().map(|g| &g.id), Some(&b.id));
        assert_eq!(f.composer.outfits().len(), 1);
    }

    #[tokio::test]
    async fn clear_selection_empties_all_slots() {
        let f = fixture();
        let a = add(&f, Category::Top).await;
        f.composer.select_slot(Category::Top, Some(a.id));
        f.composer.clear_selection();
        assert!(f.composer.selection().is_empty());
    }

    #[tokio::test]
    async fn persist_failure_keeps_outfit_in_memory() {
        let f = fixture_with_kv(InMemoryKeyValueStore::with_quota(10));
        let committed = f.composer.commit().await;
        let notice = committed.notice.expect("quota should fail the save");
        assert_eq!(notice.collection, OUTFITS_KEY);
        assert_eq!(f.composer.outfits().len(), 1);
        assert!(f.kv.get_item(OUTFITS_KEY).unwrap().is_none());
    }

    #[test]
    fn corrupt_history_loads_empty() {
        let kv = InMemoryKeyValueStore::new();
        kv.set_item(OUTFITS_KEY, "not json at all").unwrap();
        let f = fixture_with_kv(kv);
        assert!(f.composer.outfits().is_empty());
    }
}
