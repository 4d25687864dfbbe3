use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::http::request::Parts;
use axum::{extract::FromRequestParts, http::StatusCode};
use jsonwebtoken::{DecodingKey, EncodingKey, Validation};
use rand::random;
use serde::{Deserialize, Serialize};
use sha2::Digest;

/// Bearer token lifetime. Matches the 30-day sessions the web client
/// historically issued.
const TOKEN_DAYS: i64 = 30;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    /// Expiry, seconds since the epoch.
    pub exp: usize,
}

fn secret() -> Result<Vec<u8>> {
    Ok(dotenvy::var("JWT_SECRET")
        .context("Could not find JWT_SECRET in the environment")?
        .into_bytes())
}

/// Issue a signed bearer token for a user.
pub fn issue_token(user_id: i64) -> Result<String> {
    let claims = Claims {
        sub: user_id,
        exp: (chrono::Utc::now() + chrono::Duration::days(TOKEN_DAYS)).timestamp() as usize,
    };
    jsonwebtoken::encode(
        &Default::default(),
        &claims,
        &EncodingKey::from_secret(&secret()?),
    )
    .context("Signing token")
}

pub fn decode_token(token: &str) -> Result<Claims> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(&secret()?),
        &Validation::default(),
    )
    .context("Validating token")?;
    Ok(data.claims)
}

fn digest_with_salt(password: &str, salt: &[u8]) -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Salted password digest, stored as `hex(salt)$hex(sha256(salt || password))`.
pub fn new_password_digest(password: &str) -> String {
    let salt: [u8; 16] = random();
    format!("{}${}", hex::encode(salt), digest_with_salt(password, &salt))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt_hex, expected)) = stored.split_once('$') else {
        return false;
    };
    let Ok(salt) = hex::decode(salt_hex) else {
        return false;
    };
    digest_with_salt(password, &salt) == expected
}

/// Proof that the request carried a valid bearer token. Use as a request
/// guard; the wrapped id scopes every read and write.
pub struct AuthUser {
    pub user_id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
        let no = |msg: &'static str| (StatusCode::UNAUTHORIZED, msg);

        let auth_header = parts
            .headers
            .get("Authorization")
            .ok_or(no("Not authorized, no token"))?;
        let auth_str = auth_header
            .to_str()
            .map_err(|_| no("Invalid Authorization header"))?;
        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or(no("Authorization must be Bearer token"))?;

        let claims = decode_token(token).map_err(|_| no("Not authorized, token failed"))?;
        Ok(AuthUser {
            user_id: claims.sub,
        })
    }
}
