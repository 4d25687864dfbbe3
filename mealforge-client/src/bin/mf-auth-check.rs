use anyhow::{Context, Result};
use clap::Parser;
use mealforge_client::api::HttpRecipeApi;

/// Check that a bearer token is accepted by the server.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
    /// URL of the server to check against
    #[arg(long, default_value = "http://localhost:5000")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let token = dotenvy::var("MEALFORGE_TOKEN").context("MEALFORGE_TOKEN is not set")?;
    let api = HttpRecipeApi::new(args.server, token);
    let user = api.me().await.context("Token check failed")?;
    println!("Authenticated as {} <{}>", user.name, user.email);
    Ok(())
}
