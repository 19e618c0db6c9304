//! Garment catalogue for the wardrobe.
//!
//! [`Catalog`] is the single owner of the in-memory garment collection. Every
//! create, edit and delete goes through it so that garment records and the
//! images they reference stay consistent:
//!
//! - a record is only created after its image has been committed
//! - a record's image is deleted before the record itself
//! - edits never touch identity, image or creation time
//!
//! # Modules
//!
//! - [`catalog`] -- the [`Catalog`] and its configuration
//! - [`preset`] -- built-in [`Preset`] garments with synthesized placeholder images
//! - [`integrity`] -- dangling-reference and orphan-image detection and repair
//! - [`error`] -- [`CatalogError`]

pub mod catalog;
pub mod error;
pub mod integrity;
pub mod preset;

pub use catalog::{Catalog, CatalogConfig};
pub use error::{CatalogError, CatalogResult};
pub use integrity::IntegrityReport;
pub use preset::Preset;
