use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Body slot a garment is worn in.
///
/// The same six values classify garments and address outfit slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Inner,
    Top,
    Bottom,
    Outer,
    Shoes,
    Accessory,
}

impl Category {
    /// All categories in slot order.
    pub const ALL: [Category; 6] = [
        Category::Inner,
        Category::Top,
        Category::Bottom,
        Category::Outer,
        Category::Shoes,
        Category::Accessory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inner => "inner",
            Self::Top => "top",
            Self::Bottom => "bottom",
            Self::Outer => "outer",
            Self::Shoes => "shoes",
            Self::Accessory => "accessory",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| TypeError::UnknownCategory(s.to_string()))
    }
}

/// A category selector for listing garments.
///
/// `All` exists only here; it is never stored on a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl CategoryFilter {
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(c) => *c == category,
        }
    }

    /// Category given to a garment added while this filter is active.
    pub fn default_category(&self) -> Category {
        match self {
            Self::All => Category::Top,
            Self::Only(c) => *c,
        }
    }
}

impl From<Category> for CategoryFilter {
    fn from(c: Category) -> Self {
        Self::Only(c)
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(c) => c.fmt(f),
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}
