//! Foundation types for the wardrobe catalogue.
//!
//! This crate provides the record, identity and time types shared by every
//! other wardrobe crate. It performs no I/O.
//!
//! # Key Types
//!
//! - [`Garment`] — persisted metadata for one clothing item
//! - [`Outfit`] — immutable snapshot of a per-slot garment [`Selection`]
//! - [`Category`] — one of the six body slots; [`CategoryFilter`] adds the
//!   synthetic "all" value used only for filtering
//! - [`GarmentId`], [`OutfitId`], [`ImageKey`] — opaque string identifiers
//! - [`Clock`] / [`IdGenerator`] — injectable time and identifier sources

pub mod category;
pub mod clock;
pub mod error;
pub mod garment;
pub mod id;
pub mod outfit;

pub use category::{Category, CategoryFilter};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::TypeError;
pub use garment::{Garment, GarmentEdit, TempRange, DEFAULT_NAME, UNTITLED_NAME};
pub use id::{GarmentId, IdGenerator, ImageKey, OutfitId, SequentialIds, UuidV7Generator};
pub use outfit::{Outfit, Selection};
