use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;
use thiserror::Error;

use crate::auth::gate::AuthError;
use crate::streams::ComposeError;

/// Everything a handler can answer with besides success. The display string
/// is the client facing message; internal error text never reaches it.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Compose(#[from] ComposeError),
    #[error("invalid request")]
    Validation(Vec<String>),
    #[error("email already in use")]
    DuplicateEmail,
    #[error("email or password was incorrect")]
    BadCredentials,
    #[error("database error (something wrong on our end)")]
    StorageUnavailable,
    #[error("failed to generate token")]
    TokenGeneration,
    #[error("failed to process password")]
    PasswordProcessing,
    #[error("request timed out")]
    Timeout,
    #[error("not found")]
    RouteNotFound,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Auth(AuthError::RevocationUnavailable) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Auth(_) | ApiError::BadCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Compose(ComposeError::NotFound) | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::Compose(_) | ApiError::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Validation(_) | ApiError::DuplicateEmail => StatusCode::BAD_REQUEST,
            ApiError::TokenGeneration | ApiError::PasswordProcessing => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(messages) => json!({
                "errors": messages
                    .iter()
                    .map(|message| json!({ "message": message }))
                    .collect::<Vec<_>>()
            }),
            other => json!({
                "error": { "status": status.as_u16(), "message": other.to_string() }
            }),
        };
        (status, Json(body)).into_response()
    }
}
