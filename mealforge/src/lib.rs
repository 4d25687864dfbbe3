pub mod models;
pub mod wire;

pub use models::{Diet, Recipe, RecipeNutrition, RecipeParams};
pub use wire::RecipeWire;
