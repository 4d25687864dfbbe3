use itertools::Itertools;
use mealforge::models::{Diet, RecipeParams};

/// The field layout the model is asked to respond with. Kept in lockstep
/// with the draft struct in [`super::parse`].
const RESPONSE_SCHEMA: &str = r#"
{
  "title": "Recipe Title",
  "description": "Brief description of the dish",
  "ingredients": ["Ingredient 1 with measurement", "Ingredient 2 with measurement", ...],
  "instructions": ["Step 1", "Step 2", ...],
  "nutrition": {
    "calories": number,
    "protein": number (in grams),
    "fat": number (in grams),
    "carbohydrates": number (in grams)
  },
  "prepTime": "time in minutes",
  "cookTime": "time in minutes",
  "servings": number
}"#;

/// Render the user's preferences into the text-generation prompt.
///
/// Pure string assembly: absent optional fields are simply omitted, and
/// this never fails. The fixed order is the generic instruction, one line
/// per populated field, diet-specific guidance, then the JSON schema block.
pub fn build_prompt(params: &RecipeParams) -> String {
    let mut prompt = String::from(
        "Generate a detailed recipe with the following structure:\n\
         1. Title\n\
         2. Brief description\n\
         3. List of ingredients with measurements\n\
         4. Step-by-step cooking instructions\n\
         5. Nutritional information (calories, protein, fat, carbohydrates)\n\
         6. Preparation time\n\
         7. Cooking time\n\
         8. Number of servings\n\n",
    );

    if !params.diets.is_empty() {
        prompt.push_str(&format!(
            "Diet preference: {}\n",
            params.diets.iter().join(", ")
        ));
    }
    if !params.allergies.is_empty() {
        prompt.push_str(&format!(
            "Allergies (avoid these ingredients): {}\n",
            params.allergies.iter().join(", ")
        ));
    }
    if let Some(calories) = params.calories {
        prompt.push_str(&format!(
            "Target calories per serving: approximately {} calories\n",
            calories
        ));
    }
    if !params.main_ingredients.is_empty() {
        prompt.push_str(&format!(
            "Main ingredients to include: {}\n",
            params.main_ingredients.iter().join(", ")
        ));
    }
    if let Some(servings) = params.servings {
        prompt.push_str(&format!("Number of servings: {}\n", servings));
    }

    if params.diets.contains(&Diet::DiabeticFriendly) {
        prompt.push_str(
            "Keep the glycemic load low: favor complex carbohydrates and avoid added sugar.\n",
        );
    }
    if params.diets.contains(&Diet::LowCholesterol) {
        prompt.push_str(
            "Limit saturated fat and dietary cholesterol; prefer lean proteins and unsaturated oils.\n",
        );
    }

    prompt.push_str("\nFormat the response as JSON with the following structure:");
    prompt.push_str(RESPONSE_SCHEMA);
    prompt
}
