//! Cross-store consistency checks.
//!
//! The catalogue's own operations never leave a record pointing at a missing
//! image or an image nobody references. Crashes between the two stores can:
//! an image deleted whose record save then failed leaves a dangling record;
//! an image committed whose record was never saved leaves an orphan. These
//! checks find both, and [`Catalog::repair`] resolves them on the next load.
//!
//! An add between its image write and its record insert looks exactly like
//! an orphan, so [`Catalog::repair`] waits for in-flight adds and deletes and
//! holds new ones off until it is done. [`Catalog::verify`] does not, and may
//! report such an image.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{info, warn};
use wardrobe_store::Applied;
use wardrobe_types::{GarmentId, ImageKey};

use crate::catalog::Catalog;
use crate::error::CatalogResult;

/// Inconsistencies between garment records and stored images.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    /// Garments whose image key has no stored image.
    pub dangling: Vec<GarmentId>,
    /// Stored images no garment references.
    pub orphans: Vec<ImageKey>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.dangling.is_empty() && self.orphans.is_empty()
    }
}

impl Catalog {
    /// Compare garment image keys against the image store.
    pub async fn verify(&self) -> CatalogResult<IntegrityReport> {
        let stored: HashSet<ImageKey> = self.blobs().keys().await?.into_iter().collect();
        let garments = self.garments();

        let dangling = garments
            .iter()
            .filter(|g| g.image_key.as_ref().is_some_and(|k| !stored.contains(k)))
            .map(|g| g.id.clone())
            .collect();

        let referenced: HashSet<&ImageKey> =
            garments.iter().filter_map(|g| g.image_key.as_ref()).collect();
        let mut orphans: Vec<ImageKey> = stored
            .iter()
            .filter(|k| !referenced.contains(k))
            .cloned()
            .collect();
        orphans.sort();

        Ok(IntegrityReport { dangling, orphans })
    }

    /// Delete orphan images and clear dangling image keys.
    ///
    /// Dangling garments are kept without an image rather than dropped.
    /// Returns the report that was acted on.
    pub async fn repair(&self) -> CatalogResult<Applied<IntegrityReport>> {
        let _exclusive = self.exclusive().await;
        let report = self.verify().await?;
        if report.is_clean() {
            return Ok(Applied::saved(report));
        }

        for key in &report.orphans {
            let claimed = self
                .garments()
                .iter()
                .any(|g| g.image_key.as_ref() == Some(key));
            if claimed {
                continue;
            }
            self.blobs().delete(key).await?;
            warn!(key = %key, "deleted orphan image");
        }

        let detached = self.detach_images(&report.dangling);
        let notice = if detached > 0 {
            warn!(count = detached, "cleared dangling image references");
            self.persist().await
        } else {
            None
        };
        info!(
            dangling = report.dangling.len(),
            orphans = report.orphans.len(),
            "catalog repaired"
        );
        Ok(Applied {
            value: report,
            notice,
        })
    }
}
