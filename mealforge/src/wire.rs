//! Transport representation of a recipe.
//!
//! The historical API carries two identifier fields: `id` (client-origin)
//! and `_id` (store-origin). Internally we keep a single canonical id on
//! [`Recipe`]; this module is the only place where the duplication exists,
//! and [`RecipeWire::normalize`] is how the two fields are reconciled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Recipe, RecipeNutrition};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Store-assigned identifier, kept under its legacy wire name.
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub store_id: Option<String>,
    pub title: String,
    pub description: String,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
    pub nutrition: RecipeNutrition,
    pub prep_time: String,
    pub cook_time: String,
    pub servings: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl RecipeWire {
    /// Reconcile the two identifier fields so both hold the same value.
    ///
    /// The store id wins when both are present, since it is authoritative
    /// once a recipe has been persisted. A recipe with neither field set
    /// passes through unchanged. Idempotent.
    pub fn normalize(mut self) -> Self {
        let canonical = self.store_id.clone().or_else(|| self.id.clone());
        if canonical.is_some() {
            self.id = canonical.clone();
            self.store_id = canonical;
        }
        self
    }
}

impl From<RecipeWire> for Recipe {
    fn from(wire: RecipeWire) -> Self {
        Recipe {
            id: wire.store_id.or(wire.id),
            title: wire.title,
            description: wire.description,
            ingredients: wire.ingredients,
            instructions: wire.instructions,
            nutrition: wire.nutrition,
            prep_time: wire.prep_time,
            cook_time: wire.cook_time,
            servings: wire.servings,
            image_url: wire.image_url,
            created_at: wire.created_at,
            user_id: wire.user_id,
        }
    }
}

impl From<Recipe> for RecipeWire {
    /// Emit both legacy identifier fields with the canonical value.
    fn from(recipe: Recipe) -> Self {
        RecipeWire {
            id: recipe.id.clone(),
            store_id: recipe.id,
            title: recipe.title,
            description: recipe.description,
            ingredients: recipe.ingredients,
            instructions: recipe.instructions,
            nutrition: recipe.nutrition,
            prep_time: recipe.prep_time,
            cook_time: recipe.cook_time,
            servings: recipe.servings,
            image_url: recipe.image_url,
            created_at: recipe.created_at,
            user_id: recipe.user_id,
        }
    }
}

impl Recipe {
    pub fn to_wire(&self) -> RecipeWire {
        self.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(id: Option<&str>, store_id: Option<&str>) -> RecipeWire {
        RecipeWire {
            id: id.map(String::from),
            store_id: store_id.map(String::from),
            title: "Shrimp and Grits".into(),
            description: "A lowcountry classic".into(),
            ingredients: vec!["1 lb shrimp".into(), "1 cup grits".into()],
            instructions: vec!["Cook the grits".into(), "Saute the shrimp".into()],
            nutrition: RecipeNutrition {
                calories: 520.0,
                protein: 32.0,
                fat: 18.0,
                carbohydrates: 55.0,
                sugar: None,
                cholesterol: None,
                fiber: None,
            },
            prep_time: "15".into(),
            cook_time: "30".into(),
            servings: 4,
            image_url: None,
            created_at: None,
            user_id: None,
        }
    }

    #[test]
    fn normalize_prefers_the_populated_field() {
        let client_only = wire(Some("recipe_1"), None).normalize();
        assert_eq!(client_only.id.as_deref(), Some("recipe_1"));
        assert_eq!(client_only.store_id.as_deref(), Some("recipe_1"));

        let store_only = wire(None, Some("42")).normalize();
        assert_eq!(store_only.id.as_deref(), Some("42"));
        assert_eq!(store_only.store_id.as_deref(), Some("42"));
    }

    #[test]
    fn normalize_leaves_unsaved_recipes_alone() {
        let fresh = wire(None, None).normalize();
        assert_eq!(fresh.id, None);
        assert_eq!(fresh.store_id, None);
    }

    #[test]
    fn normalize_is_idempotent() {
        for (id, store_id) in [
            (Some("recipe_1"), None),
            (None, Some("42")),
            (None, None),
            (Some("42"), Some("42")),
        ] {
            let once = wire(id, store_id).normalize();
            let twice = once.clone().normalize();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn wire_serialization_emits_both_legacy_fields() {
        let recipe: Recipe = wire(None, Some("42")).normalize().into();
        let json = serde_json::to_value(recipe.to_wire()).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["_id"], "42");
        assert_eq!(json["prepTime"], "15");
        assert_eq!(json["nutrition"]["calories"], 520.0);
    }

    #[test]
    fn wire_deserialization_accepts_either_legacy_field() {
        let body = r#"{
            "_id": "64f0",
            "title": "T", "description": "D",
            "ingredients": ["x"], "instructions": ["y"],
            "nutrition": {"calories": 1, "protein": 2, "fat": 3, "carbohydrates": 4},
            "prepTime": "10", "cookTime": "20", "servings": 2
        }"#;
        let recipe: Recipe = serde_json::from_str::<RecipeWire>(body)
            .unwrap()
            .normalize()
            .into();
        assert_eq!(recipe.id.as_deref(), Some("64f0"));
    }
}
