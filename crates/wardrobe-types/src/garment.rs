use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::id::{GarmentId, ImageKey};

/// Name given to freshly added garments.
pub const DEFAULT_NAME: &str = "New item";

/// Name substituted when an edit leaves the name blank.
pub const UNTITLED_NAME: &str = "Untitled";

/// Comfortable-wear temperature range in whole degrees.
///
/// Always ordered: constructing from two values sorts them rather than
/// rejecting the input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TempRange {
    min: i32,
    max: i32,
}

impl TempRange {
    pub fn new(a: i32, b: i32) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn contains(&self, temp: i32) -> bool {
        (self.min..=self.max).contains(&temp)
    }
}

impl Default for TempRange {
    fn default() -> Self {
        Self::new(10, 25)
    }
}

/// Persisted metadata describing one clothing item.
///
/// Serialized as a camelCase JSON object; `imageKey` is omitted when absent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Garment {
    pub id: GarmentId,
    pub name: String,
    pub category: Category,
    pub temp_min: i32,
    pub temp_max: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<ImageKey>,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
}

impl Garment {
    /// Build a record, normalizing the name and ordering the range.
    pub fn new(
        id: GarmentId,
        name: &str,
        category: Category,
        range: TempRange,
        image_key: Option<ImageKey>,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            name: normalize_name(name),
            category,
            temp_min: range.min(),
            temp_max: range.max(),
            image_key,
            created_at,
        }
    }

    pub fn temp_range(&self) -> TempRange {
        TempRange::new(self.temp_min, self.temp_max)
    }

    /// Apply an edit. Identity, image and creation time never change.
    pub fn apply(&mut self, edit: &GarmentEdit) {
        let range = TempRange::new(edit.temp_min, edit.temp_max);
        self.name = normalize_name(&edit.name);
        self.category = edit.category;
        self.temp_min = range.min();
        self.temp_max = range.max();
    }

    /// Restore `temp_min <= temp_max` on a record loaded from storage.
    pub(crate) fn sort_range(&mut self) {
        let range = self.temp_range();
        self.temp_min = range.min();
        self.temp_max = range.max();
    }

    /// Normalize a record read from persisted JSON.
    ///
    /// A blank stored `imageKey` means "no image".
    pub fn normalized(mut self) -> Self {
        self.sort_range();
        if self.name.trim().is_empty() {
            self.name = UNTITLED_NAME.to_string();
        }
        if self
            .image_key
            .as_ref()
            .is_some_and(|key| key.as_str().trim().is_empty())
        {
            self.image_key = None;
        }
        self
    }
}

/// The editable fields of a garment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GarmentEdit {
    pub name: String,
    pub category: Category,
    pub temp_min: i32,
    pub temp_max: i32,
}

impl GarmentEdit {
    /// An edit that leaves every field as it currently is.
    pub fn from_garment(garment: &Garment) -> Self {
        Self {
            name: garment.name.clone(),
            category: garment.category,
            temp_min: garment.temp_min,
            temp_max: garment.temp_max,
        }
    }
}

fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        UNTITLED_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
