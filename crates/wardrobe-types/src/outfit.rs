use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::id::{GarmentId, OutfitId};

/// Per-slot garment choice: at most one garment per [`Category`].
///
/// Empty slots are simply absent. Serialized as a JSON object keyed by the
/// lowercase category name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection(BTreeMap<Category, GarmentId>);

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slot: Category) -> Option<&GarmentId> {
        self.0.get(&slot)
    }

    /// Set or clear one slot. Returns the previous occupant.
    pub fn set(&mut self, slot: Category, garment: Option<GarmentId>) -> Option<GarmentId> {
        match garment {
            Some(id) => self.0.insert(slot, id),
            None => self.0.remove(&slot),
        }
    }

    /// Filled slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &GarmentId)> {
        self.0.iter().map(|(c, id)| (*c, id))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, garment: &GarmentId) -> bool {
        self.0.values().any(|id| id == garment)
    }
}

/// An immutable snapshot of a committed selection.
///
/// Outfits may keep referencing garments that were deleted later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outfit {
    pub id: OutfitId,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
    #[serde(default)]
    pub selection: Selection,
}
