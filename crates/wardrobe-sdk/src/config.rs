use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use wardrobe_types::TempRange;

use crate::error::{SdkError, SdkResult};

/// Where the wardrobe keeps its data and which defaults new garments get.
///
/// Every field is optional in a config file; missing ones take the default.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardrobeConfig {
    pub data_dir: PathBuf,
    pub default_temp_min: i32,
    pub default_temp_max: i32,
    /// Metadata document, relative to `data_dir`.
    pub metadata_file: String,
    /// Image directory, relative to `data_dir`.
    pub images_dir: String,
}

impl Default for WardrobeConfig {
    fn default() -> Self {
        let range = TempRange::default();
        Self {
            data_dir: PathBuf::from(".wardrobe"),
            default_temp_min: range.min(),
            default_temp_max: range.max(),
            metadata_file: "metadata.json".into(),
            images_dir: wardrobe_store::IMAGES_DIR.into(),
        }
    }
}

impl WardrobeConfig {
    /// Read a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> SdkResult<Self> {
        toml::from_str(raw).map_err(|e| SdkError::Config(e.to_string()))
    }

    /// Same config rooted at another data directory.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(&self.metadata_file)
    }

    pub fn images_path(&self) -> PathBuf {
        self.data_dir.join(&self.images_dir)
    }

    /// Range given to garments added from a photo. Reversed bounds are swapped.
    pub fn default_range(&self) -> TempRange {
        TempRange::new(self.default_temp_min, self.default_temp_max)
    }
}
