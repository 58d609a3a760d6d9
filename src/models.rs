use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::category::FoodCategory;
use crate::error::{PantryError, Result};

pub type UserId = u64;
pub type FoodItemId = u64;
pub type RecipeId = u64;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A food (or medicine) item in a user's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItem {
    pub id: FoodItemId,
    pub user_id: UserId,
    pub name: String,
    pub category: FoodCategory,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub price: f64,
    /// Image reference (URL or data URI)
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when logging a new item; ids and timestamps are assigned by storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFoodItem {
    pub name: String,
    pub category: FoodCategory,
    pub manufacture_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub price: f64,
    pub image: Option<String>,
}

impl NewFoodItem {
    /// Reject items the engine would otherwise treat as nonsensical.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(PantryError::invalid("name must not be empty"));
        }
        if self.manufacture_date > self.expiry_date {
            return Err(PantryError::invalid(format!(
                "manufacture date {} is after expiry date {}",
                self.manufacture_date, self.expiry_date
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(PantryError::invalid(format!(
                "price must be a non-negative number, got {}",
                self.price
            )));
        }
        Ok(())
    }
}

/// Parse an ISO `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| PantryError::invalid(format!("invalid date '{}': {}", s.trim(), e)))
}

/// One ingredient line of a catalog recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeIngredient {
    pub id: u64,
    pub recipe_id: RecipeId,
    pub name: String,
    /// Free-text amount, e.g. "200g" or "to taste"
    pub amount: Option<String>,
    pub category: FoodCategory,
}

/// A catalog recipe together with its ingredient list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub instructions: Option<String>,
    pub ingredients: Vec<RecipeIngredient>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodItemWithDaysLeft {
    #[serde(flatten)]
    pub item: FoodItem,
    /// Negative once the item has expired
    pub days_left: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationType {
    #[serde(rename = "threeDays")]
    ThreeDays,
    #[serde(rename = "week")]
    Week,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Sequential within one generation pass only
    pub id: u64,
    pub item_id: FoodItemId,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeWithMatch {
    #[serde(flatten)]
    pub recipe: Recipe,
    /// 0-100
    pub match_percentage: u8,
    pub missing_ingredient_count: usize,
}

/// Counts shown on the dashboard cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_items: usize,
    /// Items with 4-7 days left
    pub expiring_this_week: usize,
    /// Items with 0-3 days left
    pub critical: usize,
}

/// A free-form recipe returned by the AI suggestion service.
///
/// Model output is loosely structured, so `null` fields read as empty and
/// `ingredients` may arrive as one comma-separated string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiRecipeSuggestion {
    #[serde(deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(deserialize_with = "loose_string_list")]
    pub ingredients: Vec<String>,
    #[serde(deserialize_with = "null_as_empty")]
    pub instructions: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseList {
    Many(Vec<Option<String>>),
    One(String),
}

fn loose_string_list<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Option::<LooseList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(LooseList::Many(items)) => items.into_iter().flatten().collect(),
        Some(LooseList::One(joined)) => joined.split(',').map(String::from).collect(),
    };
    Ok(entries
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_item() -> NewFoodItem {
        NewFoodItem {
            name: "Milk".to_string(),
            category: FoodCategory::Dairy,
            manufacture_date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
            price: 1.99,
            image: None,
        }
    }

    #[test]
    fn validate_accepts_well_formed_item() {
        assert!(new_item().validate().is_ok());
    }

    #[test]
    fn validate_accepts_same_day_manufacture_and_expiry() {
        let mut item = new_item();
        item.manufacture_date = item.expiry_date;
        assert!(item.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_items() {
        let mut item = new_item();
        item.manufacture_date = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        assert!(matches!(item.validate(), Err(PantryError::InvalidInput(_))));

        let mut item = new_item();
        item.name = "   ".to_string();
        assert!(item.validate().is_err());

        let mut item = new_item();
        item.price = -1.0;
        assert!(item.validate().is_err());

        let mut item = new_item();
        item.price = f64::NAN;
        assert!(item.validate().is_err());
    }

    #[test]
    fn parse_date_fails_fast_on_garbage() {
        assert_eq!(
            parse_date("2024-01-12").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 12).unwrap()
        );
        assert!(matches!(parse_date("2024-13-40"), Err(PantryError::InvalidInput(_))));
        assert!(parse_date("next tuesday").is_err());
    }

    #[test]
    fn notification_serializes_presentation_shape() {
        let n = Notification {
            id: 1,
            item_id: 7,
            message: "Milk expires in 2 days".to_string(),
            kind: NotificationType::ThreeDays,
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(&n).unwrap();
        assert_eq!(v["type"], "threeDays");
        assert_eq!(v["itemId"], 7);
    }

    #[test]
    fn ai_suggestion_tolerates_missing_fields() {
        let s: AiRecipeSuggestion = serde_json::from_str(r#"{"name": "Omelette"}"#).unwrap();
        assert_eq!(s.name, "Omelette");
        assert!(s.ingredients.is_empty());
        assert!(s.instructions.is_empty());
    }

    #[test]
    fn ai_suggestion_tolerates_nulls_and_joined_ingredients() {
        let s: AiRecipeSuggestion = serde_json::from_str(
            r#"{"name": "Soup", "description": null, "ingredients": "Carrots, Onion ,", "instructions": null}"#,
        )
        .unwrap();
        assert_eq!(s.name, "Soup");
        assert!(s.description.is_empty());
        assert_eq!(s.ingredients, vec!["Carrots", "Onion"]);
        assert!(s.instructions.is_empty());

        let s: AiRecipeSuggestion =
            serde_json::from_str(r#"{"name": "Stew", "ingredients": ["Beef", null, " "]}"#).unwrap();
        assert_eq!(s.ingredients, vec!["Beef"]);

        let s: AiRecipeSuggestion =
            serde_json::from_str(r#"{"name": "Toast", "ingredients": null}"#).unwrap();
        assert!(s.ingredients.is_empty());
    }
}
