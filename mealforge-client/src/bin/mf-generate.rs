use anyhow::{Context, Result};
use clap::Parser;
use mealforge::models::{Diet, RecipeParams};
use mealforge_client::api::HttpRecipeApi;
use mealforge_client::generation;
use mealforge_client::session::RecipeSession;

/// Generate a recipe from your preferences, and optionally save it to
/// your collection on the server.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// Main ingredients to include, comma separated (e.g. "chicken, rice")
    ingredients: String,
    /// Diet preference, repeatable (e.g. --diet Keto --diet Gluten-Free)
    #[arg(short, long)]
    diet: Vec<Diet>,
    /// Ingredients to avoid, repeatable
    #[arg(short, long)]
    allergy: Vec<String>,
    /// Target calories per serving
    #[arg(short, long)]
    calories: Option<u32>,
    /// Number of servings
    #[arg(short, long)]
    servings: Option<u32>,
    /// Save the generated recipe to the server
    #[arg(long)]
    save: bool,
    /// URL of the server to save to
    #[arg(long, default_value = "http://localhost:5000")]
    server: String,
    /// Email to log in with; the password is read from MEALFORGE_PASSWORD.
    /// Alternatively set MEALFORGE_TOKEN to skip the login.
    #[arg(long)]
    email: Option<String>,
}

async fn bearer_token(args: &Args) -> Result<String> {
    if let Ok(token) = dotenvy::var("MEALFORGE_TOKEN") {
        return Ok(token);
    }
    let email = args
        .email
        .as_deref()
        .context("Saving requires MEALFORGE_TOKEN or --email")?;
    let password =
        dotenvy::var("MEALFORGE_PASSWORD").context("MEALFORGE_PASSWORD is not set")?;
    let auth = HttpRecipeApi::login(&args.server, email, &password).await?;
    tracing::info!("Logged in as {}", auth.user.email);
    Ok(auth.token)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let params = RecipeParams {
        diets: args.diet.clone(),
        allergies: args.allergy.clone(),
        calories: args.calories,
        main_ingredients: args
            .ingredients
            .split(',')
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect(),
        servings: args.servings,
    };

    if !args.save {
        let recipe = generation::generate_recipe(&params)
            .await
            .context("Generating recipe")?;
        println!("{}", serde_json::to_string_pretty(&recipe.to_wire())?);
        return Ok(());
    }

    let token = bearer_token(&args).await?;
    let api = HttpRecipeApi::new(args.server.clone(), token);
    let mut session = RecipeSession::new(api);

    // Load the collection first so the duplicate guard has something to
    // check against.
    session.list().await.context("Fetching saved recipes")?;
    session.generate(&params).await.context("Generating recipe")?;
    let recipe = session.save_current().await.context("Saving recipe")?;
    println!("Saved as {}", recipe.id.as_deref().unwrap_or("?"));
    println!("{}", serde_json::to_string_pretty(&recipe.to_wire())?);
    Ok(())
}
