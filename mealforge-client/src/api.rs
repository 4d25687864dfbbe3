use async_trait::async_trait;
use mealforge::wire::RecipeWire;
use serde::{Deserialize, Serialize};

/// How a call to the recipe API can fail. Authentication failures are
/// kept distinct so callers can redirect to sign-in instead of retrying.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("Not authenticated")]
    Unauthorized,
    #[error("Server error: {0}")]
    Server(String),
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// The recipe collection API as the session layer consumes it.
/// Implemented over HTTP below, and by a mock in the session tests.
#[async_trait]
pub trait RecipeApi {
    /// All recipes owned by the authenticated caller, newest first.
    async fn list(&self) -> Result<Vec<RecipeWire>, ApiError>;
    /// Persist a recipe; the response carries the store-assigned id.
    async fn save(&self, recipe: &RecipeWire) -> Result<RecipeWire, ApiError>;
    /// Delete by store id; returns the deleted id on success.
    async fn delete(&self, id: &str) -> Result<String, ApiError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct DeleteResponse {
    id: String,
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserInfo,
}

/// Bearer-token client for the mealforge server.
pub struct HttpRecipeApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpRecipeApi {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    /// Trade credentials for a bearer token.
    pub async fn login(base_url: &str, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}/api/auth/login", base_url))
            .json(&LoginRequest { email, password })
            .send()
            .await?;
        let response = check(response).await?;
        Ok(response.json().await?)
    }

    /// The authenticated user behind this client's token.
    pub async fn me(&self) -> Result<UserInfo, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/auth/me", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

/// Normalize error responses: 401 means not authenticated, anything else
/// non-success becomes the server's human-readable message.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    if !status.is_success() {
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.message,
            Err(_) => status.to_string(),
        };
        return Err(ApiError::Server(message));
    }
    Ok(response)
}

#[async_trait]
impl RecipeApi for HttpRecipeApi {
    async fn list(&self) -> Result<Vec<RecipeWire>, ApiError> {
        let response = self
            .client
            .get(format!("{}/api/recipes", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn save(&self, recipe: &RecipeWire) -> Result<RecipeWire, ApiError> {
        let response = self
            .client
            .post(format!("{}/api/recipes", self.base_url))
            .bearer_auth(&self.token)
            .json(recipe)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn delete(&self, id: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .delete(format!("{}/api/recipes/{}", self.base_url, id))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let body: DeleteResponse = check(response).await?.json().await?;
        Ok(body.id)
    }
}
