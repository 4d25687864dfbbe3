use chrono::Utc;
use mealforge::models::{Recipe, RecipeNutrition};
use rand::Rng;
use serde::{Deserialize, Deserializer};

use super::GenerateError;

/// The shape the model is instructed to answer with. Deserializing into
/// this validates the response eagerly: a recipe missing a required field
/// (say `nutrition.protein`) fails here instead of somewhere downstream.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecipeDraft {
    title: String,
    description: String,
    ingredients: Vec<String>,
    instructions: Vec<String>,
    nutrition: RecipeNutrition,
    #[serde(deserialize_with = "string_or_number")]
    prep_time: String,
    #[serde(deserialize_with = "string_or_number")]
    cook_time: String,
    servings: u32,
}

/// Models sometimes answer `"prepTime": 15` despite being asked for a
/// string. Accept both and carry the string form, as the wire does.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(text) => text,
        Raw::Number(n) if n.fract() == 0.0 => format!("{}", n as i64),
        Raw::Number(n) => n.to_string(),
    })
}

/// Greedy first-`{`-to-last-`}` span, matching the shape the model is
/// prompted to produce. Text around the object (politeness, markdown
/// fences) is ignored.
fn extract_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Time-based plus a random component, enough to avoid collisions within
/// a session before the store assigns its own id.
fn synthetic_id() -> String {
    format!(
        "recipe_{}_{}",
        Utc::now().timestamp_millis(),
        rand::thread_rng().gen_range(0..1000)
    )
}

/// Turn raw model output into a validated [`Recipe`], or an explicit
/// failure. On success the recipe is stamped with a fresh synthetic id
/// and a creation timestamp; the image URL is attached separately.
pub fn parse_recipe(content: Option<&str>) -> Result<Recipe, GenerateError> {
    let text = match content {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Err(GenerateError::NoContent),
    };
    let span = extract_json_span(text).ok_or_else(|| {
        GenerateError::MalformedResponse("no JSON object in the model output".into())
    })?;
    let draft: RecipeDraft =
        serde_json::from_str(span).map_err(|e| GenerateError::MalformedResponse(e.to_string()))?;

    Ok(Recipe {
        id: Some(synthetic_id()),
        title: draft.title,
        description: draft.description,
        ingredients: draft.ingredients,
        instructions: draft.instructions,
        nutrition: draft.nutrition,
        prep_time: draft.prep_time,
        cook_time: draft.cook_time,
        servings: draft.servings,
        image_url: None,
        created_at: Some(Utc::now()),
        user_id: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_RESPONSE: &str = r#"Here is your recipe!
    {
        "title": "Chicken Fried Rice",
        "description": "A quick weeknight stir-fry",
        "ingredients": ["2 cups cooked rice", "1 lb chicken breast, diced"],
        "instructions": ["Heat the wok", "Stir-fry the chicken", "Add the rice"],
        "nutrition": {"calories": 580, "protein": 38, "fat": 14, "carbohydrates": 62},
        "prepTime": "10",
        "cookTime": 15,
        "servings": 2
    }
    Enjoy!"#;

    #[test]
    fn well_formed_output_is_copied_through() {
        let recipe = parse_recipe(Some(GOOD_RESPONSE)).unwrap();
        assert_eq!(recipe.title, "Chicken Fried Rice");
        assert_eq!(recipe.description, "A quick weeknight stir-fry");
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.instructions.len(), 3);
        assert_eq!(recipe.nutrition.calories, 580.0);
        assert_eq!(recipe.nutrition.protein, 38.0);
        assert_eq!(recipe.prep_time, "10");
        // Numeric cookTime is tolerated and carried as a string
        assert_eq!(recipe.cook_time, "15");
        assert_eq!(recipe.servings, 2);
    }

    #[test]
    fn parsed_recipes_are_stamped() {
        let recipe = parse_recipe(Some(GOOD_RESPONSE)).unwrap();
        let id = recipe.id.expect("synthetic id");
        assert!(id.starts_with("recipe_"));
        assert!(recipe.created_at.is_some());
        // The image is attached in a later stage
        assert!(recipe.image_url.is_none());
    }

    #[test]
    fn missing_content_is_no_content() {
        assert!(matches!(parse_recipe(None), Err(GenerateError::NoContent)));
        assert!(matches!(
            parse_recipe(Some("   \n")),
            Err(GenerateError::NoContent)
        ));
    }

    #[test]
    fn braceless_text_is_malformed() {
        assert!(matches!(
            parse_recipe(Some("Sorry, I cannot help with that.")),
            Err(GenerateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn invalid_json_span_is_malformed() {
        assert!(matches!(
            parse_recipe(Some("{not json at all}")),
            Err(GenerateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn missing_required_nutrition_field_is_rejected_eagerly() {
        let response = r#"{
            "title": "T", "description": "D",
            "ingredients": ["x"], "instructions": ["y"],
            "nutrition": {"calories": 500, "fat": 10, "carbohydrates": 50},
            "prepTime": "5", "cookTime": "10", "servings": 1
        }"#;
        assert!(matches!(
            parse_recipe(Some(response)),
            Err(GenerateError::MalformedResponse(_))
        ));
    }

    #[test]
    fn optional_micronutrients_pass_through() {
        let response = r#"{
            "title": "T", "description": "D",
            "ingredients": ["x"], "instructions": ["y"],
            "nutrition": {"calories": 500, "protein": 20, "fat": 10,
                          "carbohydrates": 50, "fiber": 8},
            "prepTime": "5", "cookTime": "10", "servings": 1
        }"#;
        let recipe = parse_recipe(Some(response)).unwrap();
        assert_eq!(recipe.nutrition.fiber, Some(8.0));
        assert_eq!(recipe.nutrition.sugar, None);
    }
}
