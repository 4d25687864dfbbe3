use axum::{
    http,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

pub type WebResult<T> = std::result::Result<T, WebError>;

#[derive(thiserror::Error, Debug)]
pub enum WebError {
    #[error("Server error")]
    Internal(#[from] anyhow::Error),
    #[error("{0}")]
    Auth(String),
    #[error("Recipe not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        if let WebError::Internal(e) = &self {
            tracing::error!("Internal error: {e:#}");
        }
        // Every failure crosses the boundary as a single human-readable
        // message field, never a stack trace.
        let status = match &self {
            WebError::Internal(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
            WebError::Auth(_) => http::StatusCode::UNAUTHORIZED,
            WebError::NotFound => http::StatusCode::NOT_FOUND,
            WebError::BadRequest(_) => http::StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}
