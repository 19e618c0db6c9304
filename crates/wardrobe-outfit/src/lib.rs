//! Outfit composition for the wardrobe.
//!
//! The [`Composer`] owns the in-progress per-slot [`Selection`] and the
//! append-only history of committed [`Outfit`]s.

pub mod composer;

pub use composer::{Composer, ResolvedSlot};
pub use wardrobe_types::{Outfit, Selection};
