use anyhow::{anyhow, Result};
use async_openai::types::{CreateImageRequestArgs, Image, ImageSize, ResponseFormat};
use itertools::Itertools;
use mealforge::models::Recipe;

use super::llm::OpenAIClient;

/// Ordered category table for the fallback image. The first keyword in
/// table order that appears in the title wins, so "Chicken Alfredo Pasta"
/// maps to `pasta`, not `chicken`.
const FALLBACK_IMAGES: [(&str, &str); 12] = [
    ("breakfast", "https://source.unsplash.com/1024x1024/?breakfast,food"),
    ("lunch", "https://source.unsplash.com/1024x1024/?lunch,food"),
    ("dinner", "https://source.unsplash.com/1024x1024/?dinner,food"),
    ("dessert", "https://source.unsplash.com/1024x1024/?dessert,food"),
    ("salad", "https://source.unsplash.com/1024x1024/?salad,food"),
    ("soup", "https://source.unsplash.com/1024x1024/?soup,food"),
    ("pasta", "https://source.unsplash.com/1024x1024/?pasta,food"),
    ("meat", "https://source.unsplash.com/1024x1024/?meat,food"),
    ("fish", "https://source.unsplash.com/1024x1024/?fish,food"),
    ("vegetables", "https://source.unsplash.com/1024x1024/?vegetables,food"),
    ("chicken", "https://source.unsplash.com/1024x1024/?chicken,food"),
    ("beef", "https://source.unsplash.com/1024x1024/?beef,food"),
];

const DEFAULT_IMAGE: &str = "https://source.unsplash.com/1024x1024/?cooking,food";

/// Pick a fallback image URL from the recipe title alone.
///
/// Pure function of the title: same title, same URL, every time.
pub fn fallback_image_url(title: &str) -> &'static str {
    let title = title.to_lowercase();
    FALLBACK_IMAGES
        .iter()
        .find(|(keyword, _)| title.contains(keyword))
        .map(|(_, url)| *url)
        .unwrap_or(DEFAULT_IMAGE)
}

fn image_prompt(recipe: &Recipe) -> String {
    format!(
        "A professional food photograph of {}, made with {}. \
         Appetizing, natural light, shallow depth of field.",
        recipe.title,
        recipe.ingredients.iter().take(3).join(", ")
    )
}

async fn generate_image(recipe: &Recipe) -> Result<String> {
    let request = CreateImageRequestArgs::default()
        .prompt(image_prompt(recipe))
        .n(1)
        .size(ImageSize::S1024x1024)
        .response_format(ResponseFormat::Url)
        .build()?;
    let response = OpenAIClient.images().create(request).await?;
    match response.data.first().map(|img| img.as_ref()) {
        Some(Image::Url { url, .. }) => Ok(url.clone()),
        _ => Err(anyhow!("Image endpoint returned no image URL")),
    }
}

/// Attach an image URL to a synthesized recipe. Image failure never
/// aborts generation: any error resolves to the deterministic category
/// fallback instead of propagating.
pub async fn attach_image(recipe: &mut Recipe) {
    let url = match generate_image(recipe).await {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Image generation failed ({e:#}); using fallback image");
            fallback_image_url(&recipe.title).to_string()
        }
    };
    recipe.image_url = Some(url);
}
