use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;

use crate::category::FoodCategory;
use crate::error::{PantryError, Result};
use crate::models::*;

/// Persistence capabilities the service needs. Ids only have to be stable
/// and unique; how they are generated is up to the implementation.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn create_user(&self, username: &str, name: Option<String>) -> Result<User>;

    async fn list_food_items(&self, user_id: UserId) -> Result<Vec<FoodItem>>;
    async fn get_food_item(&self, id: FoodItemId) -> Result<Option<FoodItem>>;
    async fn create_food_item(&self, user_id: UserId, item: NewFoodItem) -> Result<FoodItem>;
    async fn delete_food_item(&self, id: FoodItemId) -> Result<()>;

    /// Catalog recipes in ascending id order, ingredients not populated.
    async fn list_recipes(&self) -> Result<Vec<Recipe>>;
    async fn list_ingredients(&self, recipe_id: RecipeId) -> Result<Vec<RecipeIngredient>>;
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    food_items: BTreeMap<FoodItemId, FoodItem>,
    recipes: BTreeMap<RecipeId, Recipe>,
    ingredients: Vec<RecipeIngredient>,
    next_user_id: UserId,
    next_food_item_id: FoodItemId,
}

impl Tables {
    fn alloc_user_id(&mut self) -> UserId {
        self.next_user_id += 1;
        self.next_user_id
    }

    fn alloc_food_item_id(&mut self) -> FoodItemId {
        self.next_food_item_id += 1;
        self.next_food_item_id
    }
}

/// In-process storage. Ids come from per-table counters and are never reused.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStorage {
    /// Empty storage with an empty recipe catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-loaded with the built-in recipe catalog.
    pub fn with_seed_catalog() -> Self {
        let (recipes, ingredients) = seed_catalog();
        Self::with_catalog(recipes, ingredients)
    }

    pub fn with_catalog(recipes: Vec<Recipe>, ingredients: Vec<RecipeIngredient>) -> Self {
        let tables = Tables {
            recipes: recipes.into_iter().map(|r| (r.id, r)).collect(),
            ingredients,
            ..Default::default()
        };
        Self {
            tables: Arc::new(Mutex::new(tables)),
        }
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, username: &str, name: Option<String>) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(PantryError::invalid("username must not be empty"));
        }

        let mut tables = self.tables.lock().await;
        if tables.users.values().any(|u| u.username == username) {
            return Err(PantryError::Conflict(format!("username '{}'", username)));
        }

        let user = User {
            id: tables.alloc_user_id(),
            username: username.to_string(),
            name,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        info!(user_id = user.id, "created user");
        Ok(user)
    }

    async fn list_food_items(&self, user_id: UserId) -> Result<Vec<FoodItem>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .food_items
            .values()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_food_item(&self, id: FoodItemId) -> Result<Option<FoodItem>> {
        Ok(self.tables.lock().await.food_items.get(&id).cloned())
    }

    async fn create_food_item(&self, user_id: UserId, item: NewFoodItem) -> Result<FoodItem> {
        let mut tables = self.tables.lock().await;
        let food_item = FoodItem {
            id: tables.alloc_food_item_id(),
            user_id,
            name: item.name,
            category: item.category,
            manufacture_date: item.manufacture_date,
            expiry_date: item.expiry_date,
            price: item.price,
            image: item.image,
            created_at: Utc::now(),
        };
        tables.food_items.insert(food_item.id, food_item.clone());
        Ok(food_item)
    }

    async fn delete_food_item(&self, id: FoodItemId) -> Result<()> {
        self.tables.lock().await.food_items.remove(&id);
        Ok(())
    }

    async fn list_recipes(&self) -> Result<Vec<Recipe>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .recipes
            .values()
            .map(|r| Recipe {
                ingredients: Vec::new(),
                ..r.clone()
            })
            .collect())
    }

    async fn list_ingredients(&self, recipe_id: RecipeId) -> Result<Vec<RecipeIngredient>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .ingredients
            .iter()
            .filter(|i| i.recipe_id == recipe_id)
            .cloned()
            .collect())
    }
}

/// Built-in recipe catalog: (recipe id, name, description, image url, instructions).
const SEED_RECIPES: &[(RecipeId, &str, &str, &str, &str)] = &[
    (
        1,
        "Chicken Pasta",
        "A delicious pasta dish with chicken and vegetables",
        "https://images.unsplash.com/photo-1598866594230-a7c12756260f?auto=format&fit=crop&w=500&q=60",
        "1. Cook pasta according to package instructions. 2. Sauté chicken until fully cooked. 3. Add vegetables and sauce. 4. Mix in pasta and serve.",
    ),
    (
        2,
        "Vegetable Stir Fry",
        "A healthy stir fry with fresh vegetables",
        "https://images.unsplash.com/photo-1512621776951-a57141f2eefd?auto=format&fit=crop&w=500&q=60",
        "1. Heat oil in a pan. 2. Add vegetables and stir fry for 5 minutes. 3. Add sauce and continue cooking for 2 minutes. 4. Serve over rice.",
    ),
    (
        3,
        "Fruit Smoothie",
        "A refreshing smoothie with fresh fruits",
        "https://images.unsplash.com/photo-1568901346375-23c9450c58cd?auto=format&fit=crop&w=500&q=60",
        "1. Add all fruits to a blender. 2. Add yogurt and milk. 3. Blend until smooth. 4. Serve immediately.",
    ),
    (
        4,
        "Vegetable Soup",
        "A hearty vegetable soup",
        "https://images.unsplash.com/photo-1547592180-85f173990554?auto=format&fit=crop&w=500&q=60",
        "1. Sauté onions and garlic. 2. Add vegetables and broth. 3. Simmer for 20 minutes. 4. Season and serve.",
    ),
    (
        5,
        "Rice Bowl",
        "A nutritious rice bowl with vegetables and protein",
        "https://images.unsplash.com/photo-1512058564366-18510be2db19?auto=format&fit=crop&w=500&q=60",
        "1. Cook rice according to package instructions. 2. Prepare vegetables and protein. 3. Assemble bowl with rice, vegetables, and protein. 4. Add sauce and serve.",
    ),
];

/// (recipe id, name, amount, category)
const SEED_INGREDIENTS: &[(RecipeId, &str, &str, FoodCategory)] = &[
    (1, "Pasta", "200g", FoodCategory::Grains),
    (1, "Chicken", "300g", FoodCategory::Meat),
    (1, "Bell Peppers", "1", FoodCategory::Vegetables),
    (1, "Onion", "1", FoodCategory::Vegetables),
    (1, "Garlic", "2 cloves", FoodCategory::Vegetables),
    (1, "Tomato Sauce", "200ml", FoodCategory::Other),
    (1, "Olive Oil", "2 tbsp", FoodCategory::Other),
    (1, "Salt", "to taste", FoodCategory::Other),
    (2, "Broccoli", "1 head", FoodCategory::Vegetables),
    (2, "Carrots", "2", FoodCategory::Vegetables),
    (2, "Bell Peppers", "2", FoodCategory::Vegetables),
    (2, "Onion", "1", FoodCategory::Vegetables),
    (2, "Garlic", "3 cloves", FoodCategory::Vegetables),
    (2, "Soy Sauce", "3 tbsp", FoodCategory::Other),
    (2, "Vegetable Oil", "2 tbsp", FoodCategory::Other),
    (3, "Banana", "1", FoodCategory::Fruits),
    (3, "Strawberries", "100g", FoodCategory::Fruits),
    (3, "Blueberries", "50g", FoodCategory::Fruits),
    (3, "Yogurt", "100g", FoodCategory::Dairy),
    (3, "Milk", "200ml", FoodCategory::Dairy),
    (4, "Carrots", "2", FoodCategory::Vegetables),
    (4, "Celery", "2 stalks", FoodCategory::Vegetables),
    (4, "Onion", "1", FoodCategory::Vegetables),
    (4, "Garlic", "2 cloves", FoodCategory::Vegetables),
    (4, "Potatoes", "2", FoodCategory::Vegetables),
    (4, "Vegetable Broth", "1L", FoodCategory::Other),
    (4, "Olive Oil", "2 tbsp", FoodCategory::Other),
    (4, "Herbs", "to taste", FoodCategory::Other),
    (4, "Salt", "to taste", FoodCategory::Other),
    (5, "Rice", "200g", FoodCategory::Grains),
    (5, "Avocado", "1", FoodCategory::Vegetables),
    (5, "Cucumber", "1", FoodCategory::Vegetables),
    (5, "Carrots", "1", FoodCategory::Vegetables),
    (5, "Eggs", "2", FoodCategory::Other),
    (5, "Soy Sauce", "2 tbsp", FoodCategory::Other),
];

/// The built-in catalog. Ingredient ids are assigned in listing order from 1.
pub fn seed_catalog() -> (Vec<Recipe>, Vec<RecipeIngredient>) {
    let recipes = SEED_RECIPES
        .iter()
        .map(|(id, name, description, image_url, instructions)| Recipe {
            id: *id,
            name: name.to_string(),
            description: Some(description.to_string()),
            image_url: Some(image_url.to_string()),
            instructions: Some(instructions.to_string()),
            ingredients: Vec::new(),
        })
        .collect();

    let ingredients = SEED_INGREDIENTS
        .iter()
        .enumerate()
        .map(|(idx, (recipe_id, name, amount, category))| RecipeIngredient {
            id: idx as u64 + 1,
            recipe_id: *recipe_id,
            name: name.to_string(),
            amount: Some(amount.to_string()),
            category: *category,
        })
        .collect();

    (recipes, ingredients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn milk() -> NewFoodItem {
        NewFoodItem {
            name: "Milk".to_string(),
            category: FoodCategory::Dairy,
            manufacture_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            expiry_date: NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
            price: 1.2,
            image: None,
        }
    }

    #[tokio::test]
    async fn ids_are_unique_and_not_reused() {
        let storage = MemoryStorage::new();
        let a = storage.create_food_item(1, milk()).await.unwrap();
        let b = storage.create_food_item(1, milk()).await.unwrap();
        assert_ne!(a.id, b.id);

        storage.delete_food_item(b.id).await.unwrap();
        let c = storage.create_food_item(1, milk()).await.unwrap();
        assert!(c.id > b.id);
    }

    #[tokio::test]
    async fn food_items_are_scoped_per_user() {
        let storage = MemoryStorage::new();
        storage.create_food_item(1, milk()).await.unwrap();
        storage.create_food_item(2, milk()).await.unwrap();
        storage.create_food_item(1, milk()).await.unwrap();

        let items = storage.list_food_items(1).await.unwrap();
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| i.user_id == 1));
        assert!(items[0].id < items[1].id);
    }

    #[tokio::test]
    async fn duplicate_usernames_conflict() {
        let storage = MemoryStorage::new();
        let user = storage.create_user("alice", None).await.unwrap();
        assert_eq!(
            storage.get_user_by_username("alice").await.unwrap(),
            Some(user.clone())
        );
        assert_eq!(storage.get_user(user.id).await.unwrap(), Some(user));
        assert!(matches!(
            storage.create_user("alice", Some("Alice".into())).await,
            Err(PantryError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn seed_catalog_is_complete() {
        let storage = MemoryStorage::with_seed_catalog();
        let recipes = storage.list_recipes().await.unwrap();
        assert_eq!(recipes.len(), 5);
        assert_eq!(recipes[0].name, "Chicken Pasta");

        let mut total = 0;
        for recipe in &recipes {
            let ingredients = storage.list_ingredients(recipe.id).await.unwrap();
            assert!(ingredients.iter().all(|i| i.recipe_id == recipe.id));
            total += ingredients.len();
        }
        assert_eq!(total, 35);
        assert_eq!(storage.list_ingredients(3).await.unwrap().len(), 5);
    }
}
