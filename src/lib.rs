pub mod category;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod models;
pub mod service;
pub mod storage;
pub mod suggestions;

pub use category::{normalize_category, FoodCategory};
pub use error::PantryError;
pub use service::PantryService;
pub use storage::{MemoryStorage, Storage};
