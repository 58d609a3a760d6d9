use chrono::{NaiveDate, Utc};
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::engine;
use crate::error::{PantryError, Result};
use crate::models::*;
use crate::storage::Storage;
use crate::suggestions::{RecipeSuggester, DEFAULT_SUGGESTION_COUNT};

/// Joins storage, the recommendation engine and the optional AI suggester
/// into the per-user views the presentation layer consumes.
///
/// Every view is recomputed from a fresh storage snapshot on each call.
pub struct PantryService<S> {
    storage: S,
    suggester: Option<Box<dyn RecipeSuggester>>,
    suggestion_count: usize,
}

impl<S: Storage> PantryService<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            suggester: None,
            suggestion_count: DEFAULT_SUGGESTION_COUNT,
        }
    }

    /// Build a service wired the way `config` describes: the Gemini client is
    /// attached when an API key is set, and `ai_recipe_count` becomes the
    /// default number of AI suggestions.
    pub fn from_config(storage: S, config: &Config) -> Self {
        let service = Self::new(storage).with_suggestion_count(config.ai_recipe_count);
        match config.gemini_client() {
            Some(client) => {
                info!(model = client.model(), "AI recipe suggestions enabled");
                service.with_suggester(client)
            }
            None => service,
        }
    }

    pub fn with_suggester(mut self, suggester: impl RecipeSuggester + 'static) -> Self {
        self.suggester = Some(Box::new(suggester));
        self
    }

    pub fn with_suggestion_count(mut self, count: usize) -> Self {
        self.suggestion_count = count;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn suggestion_count(&self) -> usize {
        self.suggestion_count
    }

    pub async fn register(&self, username: &str, name: Option<String>) -> Result<User> {
        let username = username.trim();
        if self.storage.get_user_by_username(username).await?.is_some() {
            warn!(username, "username already taken");
            return Err(PantryError::Conflict(format!("username '{}'", username)));
        }
        let user = self.storage.create_user(username, name).await?;
        info!(user_id = user.id, "registered user");
        Ok(user)
    }

    async fn require_user(&self, user_id: UserId) -> Result<User> {
        self.storage
            .get_user(user_id)
            .await?
            .ok_or_else(|| PantryError::NotFound(format!("user {}", user_id)))
    }

    async fn snapshot(&self, user_id: UserId, today: NaiveDate) -> Result<Vec<FoodItemWithDaysLeft>> {
        self.require_user(user_id).await?;
        let items = self.storage.list_food_items(user_id).await?;
        Ok(engine::with_days_left(&items, today))
    }

    /// All of the user's items with days left, in storage order.
    pub async fn food_items(
        &self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<FoodItemWithDaysLeft>> {
        self.snapshot(user_id, today).await
    }

    #[instrument(skip(self, item), fields(name = %item.name, category = %item.category))]
    pub async fn add_food_item(&self, user_id: UserId, item: NewFoodItem) -> Result<FoodItem> {
        self.require_user(user_id).await?;
        item.validate()?;
        let created = self.storage.create_food_item(user_id, item).await?;
        info!(item_id = created.id, "added food item");
        Ok(created)
    }

    /// Delete one of the user's items. Items belonging to someone else are refused.
    pub async fn delete_food_item(&self, user_id: UserId, item_id: FoodItemId) -> Result<()> {
        let item = self
            .storage
            .get_food_item(item_id)
            .await?
            .ok_or_else(|| PantryError::NotFound(format!("food item {}", item_id)))?;

        if item.user_id != user_id {
            warn!(user_id, item_id, "refused to delete another user's item");
            return Err(PantryError::Forbidden(format!(
                "food item {} belongs to another user",
                item_id
            )));
        }

        self.storage.delete_food_item(item_id).await?;
        info!(user_id, item_id, "deleted food item");
        Ok(())
    }

    pub async fn expiring_items(
        &self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<FoodItemWithDaysLeft>> {
        Ok(engine::expiring_soon(&self.snapshot(user_id, today).await?))
    }

    pub async fn critical_items(
        &self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<FoodItemWithDaysLeft>> {
        Ok(engine::critical(&self.snapshot(user_id, today).await?))
    }

    pub async fn dashboard(&self, user_id: UserId, today: NaiveDate) -> Result<DashboardSummary> {
        Ok(engine::dashboard_summary(&self.snapshot(user_id, today).await?))
    }

    pub async fn notifications(&self, user_id: UserId, today: NaiveDate) -> Result<Vec<Notification>> {
        self.require_user(user_id).await?;
        let items = self.storage.list_food_items(user_id).await?;
        Ok(engine::notifications(&items, today, Utc::now()))
    }

    pub async fn medicines(
        &self,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<Vec<FoodItemWithDaysLeft>> {
        Ok(engine::medicines(&self.snapshot(user_id, today).await?))
    }

    /// Catalog recipes with their ingredient lists attached.
    pub async fn catalog(&self) -> Result<Vec<Recipe>> {
        let mut recipes = self.storage.list_recipes().await?;
        for recipe in &mut recipes {
            recipe.ingredients = self.storage.list_ingredients(recipe.id).await?;
        }
        Ok(recipes)
    }

    /// Catalog recipes ranked by how many ingredient categories the user has on hand.
    pub async fn recipes(&self, user_id: UserId) -> Result<Vec<RecipeWithMatch>> {
        self.require_user(user_id).await?;
        let items = self.storage.list_food_items(user_id).await?;
        let available = engine::inventory_categories(&items);
        let catalog = self.catalog().await?;
        Ok(engine::rank_recipes(&available, &catalog))
    }

    /// Ask the AI suggester for recipes built from the user's food (never medicines).
    /// `None` asks for the configured default count.
    pub async fn ai_recipes(
        &self,
        user_id: UserId,
        count: Option<usize>,
    ) -> Result<Vec<AiRecipeSuggestion>> {
        let count = count.unwrap_or(self.suggestion_count);
        let suggester = self
            .suggester
            .as_ref()
            .ok_or(PantryError::SuggestionsUnavailable)?;

        self.require_user(user_id).await?;
        let names: Vec<String> = self
            .storage
            .list_food_items(user_id)
            .await?
            .into_iter()
            .filter(|i| i.category.is_food())
            .map(|i| i.name)
            .collect();

        debug!(ingredients = names.len(), count, "requesting AI recipe suggestions");
        suggester
            .suggest(&names, count)
            .await
            .map_err(PantryError::Suggestions)
    }
}
