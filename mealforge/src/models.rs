use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Recognized diet tags. The display form is what goes into prompts and
/// what the CLI accepts, e.g. `Low-Carb` or `Diabetic-Friendly`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, IntoStaticStr,
)]
pub enum Diet {
    Vegetarian,
    Vegan,
    Pescatarian,
    Keto,
    Paleo,
    #[strum(serialize = "Low-Carb")]
    LowCarb,
    #[strum(serialize = "Low-Fat")]
    LowFat,
    Mediterranean,
    #[strum(serialize = "Gluten-Free")]
    GlutenFree,
    #[strum(serialize = "Diabetic-Friendly")]
    DiabeticFriendly,
    #[strum(serialize = "Low-Cholesterol")]
    LowCholesterol,
}

/// The user-supplied preference set driving one generation request.
/// All fields are optional except that `main_ingredients` must be
/// non-empty before a request is considered valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeParams {
    pub diets: Vec<Diet>,
    pub allergies: Vec<String>,
    /// Target calories per serving.
    pub calories: Option<u32>,
    pub main_ingredients: Vec<String>,
    pub servings: Option<u32>,
}

/// Per-serving nutrition facts. The first four fields are required on any
/// recipe accepted into storage; the micronutrients may be absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeNutrition {
    pub calories: f64,
    pub protein: f64,
    pub fat: f64,
    pub carbohydrates: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sugar: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cholesterol: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fiber: Option<f64>,
}

/// One generated or saved dish. This is the canonical in-memory form:
/// a single identifier, regardless of which legacy field it arrived on
/// (see [`crate::wire::RecipeWire`] for the transport form).
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    /// Client-generated before save, store-assigned after.
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    /// Free-text quantity + name, one entry per ingredient.
    pub ingredients: Vec<String>,
    /// One step per entry.
    pub instructions: Vec<String>,
    pub nutrition: RecipeNutrition,
    /// Minutes, carried as a string in transit.
    pub prep_time: String,
    pub cook_time: String,
    pub servings: u32,
    /// Always populated after generation, either a real generated image
    /// or a category fallback.
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    /// Set server-side only, never accepted from client input.
    pub user_id: Option<String>,
}

impl Recipe {
    /// Two recipes are the same saved item when title and description both
    /// match exactly, even if their identifiers differ.
    pub fn is_same_dish(&self, other: &Recipe) -> bool {
        self.title == other.title && self.description == other.description
    }
}
