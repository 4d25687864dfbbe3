use mealforge::models::{Recipe, RecipeParams};

pub mod illustrate;
pub mod llm;
pub mod parse;
pub mod prompt;

pub use illustrate::fallback_image_url;
pub use prompt::build_prompt;

/// How recipe generation can fail. Image generation is deliberately
/// absent: an image failure degrades to a fallback URL instead of
/// aborting the recipe (see [`illustrate`]).
#[derive(thiserror::Error, Debug)]
pub enum GenerateError {
    #[error("The model returned no content")]
    NoContent,
    #[error("Could not parse a recipe from the model response: {0}")]
    MalformedResponse(String),
    #[error("Text generation request failed: {0}")]
    Upstream(#[from] async_openai::error::OpenAIError),
}

/// Run the full generation pipeline: prompt, chat completion, parse,
/// image attachment. Returns a recipe with a synthetic id, a creation
/// timestamp, and an image URL that is always populated.
pub async fn generate_recipe(params: &RecipeParams) -> Result<Recipe, GenerateError> {
    let prompt = prompt::build_prompt(params);
    tracing::debug!("Prompt: {}", prompt);
    let content = llm::call_llm(&prompt).await?;
    let mut recipe = parse::parse_recipe(content.as_deref())?;
    illustrate::attach_image(&mut recipe).await;
    Ok(recipe)
}
