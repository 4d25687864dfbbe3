use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use clap::Parser;
use mealforge::wire::RecipeWire;
use mealforge_server::{
    auth::{self, AuthUser},
    database::Database,
    errors::{WebError, WebResult},
    models::{DeleteOutcome, FetchOutcome, RecipeDoc, User},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// The address and optionally port to bind to
    #[clap(long, default_value = "0.0.0.0:5000")]
    address: String,

    /// Whether to use HTTPS / TLS
    #[clap(long)]
    tls: bool,

    /// TLS certificate chain, PEM
    #[clap(long, default_value = "/etc/letsencrypt/live/mealforge/fullchain.pem")]
    tls_cert: String,

    /// TLS private key, PEM
    #[clap(long, default_value = "/etc/letsencrypt/live/mealforge/privkey.pem")]
    tls_key: String,
}

#[derive(Clone)]
struct AppState {
    db: Database,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    // initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args = Args::parse();

    // connect to the database
    let db = Database::connect_default()
        .await
        .context("Connecting to database")?;

    // build our application with a route
    let app = Router::new()
        // `GET /health` goes to `health`
        .route("/health", get(health))
        // `POST /api/auth/register` goes to `register`
        .route("/api/auth/register", post(register))
        // `POST /api/auth/login` goes to `login`
        .route("/api/auth/login", post(login))
        // `GET /api/auth/me` goes to `me`
        .route("/api/auth/me", get(me))
        // `GET /api/recipes` and `POST /api/recipes` for the collection
        .route("/api/recipes", get(list_recipes).post(create_recipe))
        // `GET`, `PUT` and `DELETE /api/recipes/:id` for a single recipe
        .route(
            "/api/recipes/:id",
            get(get_recipe).put(update_recipe).delete(delete_recipe),
        )
        .layer(
            tower_http::compression::CompressionLayer::new()
                .quality(tower_http::CompressionLevel::Fastest),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(AppState { db });

    // In development, use HTTP. In production, use HTTPS.
    if args.tls {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
        let tls_config =
            axum_server::tls_rustls::RustlsConfig::from_pem_file(&args.tls_cert, &args.tls_key)
                .await
                .context("Loading TLS certificate")?;

        let addr = args.address.parse()?;
        tracing::info!("Listening on {}", addr);
        axum_server::bind_rustls(addr, tls_config)
            .serve(app.into_make_service())
            .await
            .context("Starting TLS server")?;
    } else {
        let listener = tokio::net::TcpListener::bind(args.address).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);
        axum::serve(listener, app).await?;
    }
    Ok(())
}

// Just reply that everything is okay
async fn health() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    name: String,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Serialize)]
struct UserInfo {
    id: String,
    name: String,
    email: String,
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        UserInfo {
            id: user.user_id.to_string(),
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    token: String,
    user: UserInfo,
}

/// Create an account and hand back a bearer token right away.
async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> WebResult<(StatusCode, Json<AuthResponse>)> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(WebError::BadRequest(
            "Please provide an email and password".into(),
        ));
    }
    if User::find_by_email(&state.db, &request.email)?.is_some() {
        return Err(WebError::BadRequest("User already exists".into()));
    }
    let digest = auth::new_password_digest(&request.password);
    let user_id = User::push(&state.db, &request.name, &request.email, &digest)?;
    let user = User::get_by_id(&state.db, user_id)?
        .ok_or_else(|| WebError::Internal(anyhow::anyhow!("User vanished after insert")))?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token: auth::issue_token(user_id)?,
            user: user.into(),
        }),
    ))
}

/// Trade credentials for a bearer token. Unknown email and wrong password
/// are indistinguishable on purpose.
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> WebResult<Json<AuthResponse>> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(WebError::BadRequest(
            "Please provide an email and password".into(),
        ));
    }
    let invalid = || WebError::Auth("Invalid credentials".into());
    let user = User::find_by_email(&state.db, &request.email)?.ok_or_else(invalid)?;
    if !auth::verify_password(&request.password, &user.password_digest) {
        return Err(invalid());
    }
    Ok(Json(AuthResponse {
        token: auth::issue_token(user.user_id)?,
        user: user.into(),
    }))
}

/// The user behind the presented token.
async fn me(State(state): State<AppState>, caller: AuthUser) -> WebResult<Json<UserInfo>> {
    let user = User::get_by_id(&state.db, caller.user_id)?
        .ok_or_else(|| WebError::Auth("Not authorized, user not found".into()))?;
    Ok(Json(UserInfo::from(user)))
}

/// All recipes owned by the caller, newest first.
async fn list_recipes(
    State(state): State<AppState>,
    caller: AuthUser,
) -> WebResult<Json<Vec<RecipeWire>>> {
    let docs = RecipeDoc::list_for_user(&state.db, caller.user_id)?;
    Ok(Json(docs.iter().map(RecipeDoc::to_wire).collect()))
}

/// Store a recipe for the caller. Identifier and owner fields in the
/// upload are ignored; the response carries the assigned id on both
/// legacy identifier fields.
async fn create_recipe(
    State(state): State<AppState>,
    caller: AuthUser,
    Json(upload): Json<RecipeWire>,
) -> WebResult<(StatusCode, Json<RecipeWire>)> {
    let doc = RecipeDoc::push(&state.db, caller.user_id, &upload)?;
    tracing::info!("Stored recipe {} for user {}", doc.recipe_id, caller.user_id);
    Ok((StatusCode::CREATED, Json(doc.to_wire())))
}

/// One of the caller's recipes by id.
async fn get_recipe(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> WebResult<Json<RecipeWire>> {
    let recipe_id: i64 = id.parse().map_err(|_| WebError::NotFound)?;
    match RecipeDoc::get_owned(&state.db, recipe_id, caller.user_id)? {
        FetchOutcome::NotFound => Err(WebError::NotFound),
        FetchOutcome::NotOwner => Err(WebError::Auth(
            "Not authorized to access this recipe".into(),
        )),
        FetchOutcome::Found(doc) => Ok(Json(doc.to_wire())),
    }
}

/// Replace the content of one of the caller's recipes; returns the
/// stored document after the rewrite. Identifier and owner fields in
/// the upload are ignored, same as on create.
async fn update_recipe(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
    Json(upload): Json<RecipeWire>,
) -> WebResult<Json<RecipeWire>> {
    let recipe_id: i64 = id.parse().map_err(|_| WebError::NotFound)?;
    match RecipeDoc::update_owned(&state.db, recipe_id, caller.user_id, &upload)? {
        FetchOutcome::NotFound => Err(WebError::NotFound),
        FetchOutcome::NotOwner => Err(WebError::Auth(
            "Not authorized to update this recipe".into(),
        )),
        FetchOutcome::Found(doc) => {
            tracing::info!("Updated recipe {} for user {}", doc.recipe_id, caller.user_id);
            Ok(Json(doc.to_wire()))
        }
    }
}

/// Delete one of the caller's recipes; echoes the deleted id.
async fn delete_recipe(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> WebResult<Json<serde_json::Value>> {
    let recipe_id: i64 = id.parse().map_err(|_| WebError::NotFound)?;
    match RecipeDoc::delete_owned(&state.db, recipe_id, caller.user_id)? {
        DeleteOutcome::NotFound => Err(WebError::NotFound),
        DeleteOutcome::NotOwner => Err(WebError::Auth(
            "Not authorized to delete this recipe".into(),
        )),
        DeleteOutcome::Deleted => Ok(Json(json!({ "id": id }))),
    }
}
