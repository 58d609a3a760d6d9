use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PantryError;

/// Classification tag shared by inventory items and recipe ingredients.
///
/// `Medicines` is tracked for expiry like any other item but is never
/// food: it is left out of recipe matching and AI suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Dairy,
    Meat,
    Vegetables,
    Fruits,
    Grains,
    Other,
    Medicines,
}

impl FoodCategory {
    /// The food categories, in declaration order.
    pub const FOOD: [FoodCategory; 6] = [
        FoodCategory::Dairy,
        FoodCategory::Meat,
        FoodCategory::Vegetables,
        FoodCategory::Fruits,
        FoodCategory::Grains,
        FoodCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FoodCategory::Dairy => "dairy",
            FoodCategory::Meat => "meat",
            FoodCategory::Vegetables => "vegetables",
            FoodCategory::Fruits => "fruits",
            FoodCategory::Grains => "grains",
            FoodCategory::Other => "other",
            FoodCategory::Medicines => "medicines",
        }
    }

    pub fn is_food(&self) -> bool {
        !matches!(self, FoodCategory::Medicines)
    }

    /// Singular spelling used when matching free text ("vegetable", "fruit").
    fn singular(&self) -> &'static str {
        match self {
            FoodCategory::Vegetables => "vegetable",
            FoodCategory::Fruits => "fruit",
            FoodCategory::Grains => "grain",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for FoodCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodCategory {
    type Err = PantryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        FoodCategory::FOOD
            .iter()
            .chain(std::iter::once(&FoodCategory::Medicines))
            .find(|c| c.as_str() == wanted)
            .copied()
            .ok_or_else(|| PantryError::invalid(format!("unknown category '{}'", s.trim())))
    }
}

const SYNONYMS: &[(&str, FoodCategory)] = &[
    ("bakery", FoodCategory::Grains),
    ("bread", FoodCategory::Grains),
    ("cereal", FoodCategory::Grains),
    ("pasta", FoodCategory::Grains),
    ("rice", FoodCategory::Grains),
    ("produce", FoodCategory::Vegetables),
    ("milk", FoodCategory::Dairy),
    ("cheese", FoodCategory::Dairy),
    ("poultry", FoodCategory::Meat),
    ("seafood", FoodCategory::Meat),
    ("fish", FoodCategory::Meat),
    ("medication", FoodCategory::Medicines),
    ("medicine", FoodCategory::Medicines),
    ("pharmacy", FoodCategory::Medicines),
];

/// Map a free-text category (as produced by an AI model or typed by a user)
/// onto the fixed enumeration. Unrecognised text falls back to `Other`.
pub fn normalize_category(text: &str) -> FoodCategory {
    let normalized = text.trim().to_lowercase();
    if normalized.is_empty() {
        return FoodCategory::Other;
    }

    if let Ok(exact) = normalized.parse::<FoodCategory>() {
        return exact;
    }

    // "other" only matches exactly, never as a substring.
    if let Some(found) = FoodCategory::FOOD
        .iter()
        .filter(|c| **c != FoodCategory::Other)
        .find(|c| normalized.contains(c.singular()))
    {
        return *found;
    }

    // Synonyms match whole words (plural "s" allowed), so "licorice" is not rice.
    let words: Vec<&str> = normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    SYNONYMS
        .iter()
        .find(|(synonym, _)| {
            words
                .iter()
                .any(|w| w == synonym || w.strip_suffix('s') == Some(*synonym))
        })
        .map(|(_, category)| *category)
        .unwrap_or(FoodCategory::Other)
}
