use std::collections::BTreeSet;

use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::debug;

use crate::category::FoodCategory;
use crate::models::*;

/// Upper bound (inclusive) of the notification window, in days.
pub const WEEK_WINDOW_DAYS: i64 = 7;
/// Upper bound (inclusive) of the critical bucket, in days.
pub const CRITICAL_WINDOW_DAYS: i64 = 3;

/// Today's local calendar date, for callers without their own reference date.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole calendar days from `today` until `expiry`. Zero means it expires
/// today, negative means it has already expired.
///
/// Every bucket below is derived from this value so the boundaries agree.
pub fn days_left(expiry: NaiveDate, today: NaiveDate) -> i64 {
    (expiry - today).num_days()
}

fn in_window(days_left: i64) -> bool {
    (0..=WEEK_WINDOW_DAYS).contains(&days_left)
}

fn is_critical(days_left: i64) -> bool {
    (0..=CRITICAL_WINDOW_DAYS).contains(&days_left)
}

/// Attach `days_left` to every item, keeping input order.
pub fn with_days_left(items: &[FoodItem], today: NaiveDate) -> Vec<FoodItemWithDaysLeft> {
    items
        .iter()
        .map(|item| FoodItemWithDaysLeft {
            days_left: days_left(item.expiry_date, today),
            item: item.clone(),
        })
        .collect()
}

/// Items expiring within the next week (today included), earliest first.
/// Already expired items are left out.
pub fn expiring_soon(items: &[FoodItemWithDaysLeft]) -> Vec<FoodItemWithDaysLeft> {
    let mut soon: Vec<_> = items
        .iter()
        .filter(|i| in_window(i.days_left))
        .cloned()
        .collect();
    soon.sort_by_key(|i| (i.days_left, i.item.id));
    soon
}

/// Items with at most three days left, earliest first.
pub fn critical(items: &[FoodItemWithDaysLeft]) -> Vec<FoodItemWithDaysLeft> {
    let mut critical: Vec<_> = items
        .iter()
        .filter(|i| is_critical(i.days_left))
        .cloned()
        .collect();
    critical.sort_by_key(|i| (i.days_left, i.item.id));
    critical
}

pub fn dashboard_summary(items: &[FoodItemWithDaysLeft]) -> DashboardSummary {
    let mut summary = DashboardSummary {
        total_items: items.len(),
        ..Default::default()
    };
    for item in items {
        if is_critical(item.days_left) {
            summary.critical += 1;
        } else if in_window(item.days_left) {
            summary.expiring_this_week += 1;
        }
    }
    summary
}

/// One notification per item inside the week window, in input order.
///
/// Ids restart at 1 on every call; `created_at` is stamped on every entry.
pub fn notifications(
    items: &[FoodItem],
    today: NaiveDate,
    created_at: DateTime<Utc>,
) -> Vec<Notification> {
    let mut next_id = 1;
    let mut out = Vec::new();

    for item in items {
        let days = days_left(item.expiry_date, today);
        if !in_window(days) {
            continue;
        }
        let kind = if is_critical(days) {
            NotificationType::ThreeDays
        } else {
            NotificationType::Week
        };
        out.push(Notification {
            id: next_id,
            item_id: item.id,
            message: format!("{} expires in {} days", item.name, days),
            kind,
            created_at,
        });
        next_id += 1;
    }

    debug!(items = items.len(), notifications = out.len(), "generated notifications");
    out
}

/// Food categories present in the inventory. Medicines never count.
pub fn inventory_categories(items: &[FoodItem]) -> BTreeSet<FoodCategory> {
    items
        .iter()
        .map(|i| i.category)
        .filter(FoodCategory::is_food)
        .collect()
}

/// Only the medicinal items, with their days left.
pub fn medicines(items: &[FoodItemWithDaysLeft]) -> Vec<FoodItemWithDaysLeft> {
    items
        .iter()
        .filter(|i| i.item.category == FoodCategory::Medicines)
        .cloned()
        .collect()
}

/// Score a single recipe against the set of categories on hand.
///
/// An ingredient counts as available when any inventory item shares its
/// category. A recipe without ingredients scores 0% with nothing missing.
pub fn match_recipe(available: &BTreeSet<FoodCategory>, recipe: &Recipe) -> RecipeWithMatch {
    let total = recipe.ingredients.len();
    let matching = recipe
        .ingredients
        .iter()
        .filter(|ing| available.contains(&ing.category))
        .count();

    let match_percentage = if total == 0 {
        0
    } else {
        (100.0 * matching as f64 / total as f64).round() as u8
    };

    RecipeWithMatch {
        recipe: recipe.clone(),
        match_percentage,
        missing_ingredient_count: total - matching,
    }
}

/// Score every recipe and order best match first. Equal scores keep their
/// catalog order.
pub fn rank_recipes(
    available: &BTreeSet<FoodCategory>,
    recipes: &[Recipe],
) -> Vec<RecipeWithMatch> {
    let mut ranked: Vec<_> = recipes.iter().map(|r| match_recipe(available, r)).collect();
    ranked.sort_by(|a, b| b.match_percentage.cmp(&a.match_percentage));
    debug!(
        recipes = ranked.len(),
        categories = available.len(),
        "ranked recipes"
    );
    ranked
}
