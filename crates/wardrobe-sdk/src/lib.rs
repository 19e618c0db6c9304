//! High-level SDK for the wardrobe.
//!
//! [`Wardrobe`] opens the metadata and image stores described by a
//! [`WardrobeConfig`] and wires the catalogue, the outfit composer and the
//! image cache on top of them. This is the main entry point for
//! applications embedding the wardrobe.

pub mod config;
pub mod error;
pub mod wardrobe;

pub use config::WardrobeConfig;
pub use error::{SdkError, SdkResult};
pub use wardrobe::Wardrobe;

// Re-export key types
pub use wardrobe_cache::{ImageHandle, ImageUrlCache};
pub use wardrobe_catalog::{Catalog, IntegrityReport, Preset};
pub use wardrobe_outfit::{Composer, ResolvedSlot};
pub use wardrobe_store::{Applied, PersistNotice};
pub use wardrobe_types::{
    Category, CategoryFilter, Garment, GarmentEdit, GarmentId, ImageKey, Outfit, OutfitId,
    Selection, TempRange,
};
