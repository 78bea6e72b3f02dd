use axum::body::Bytes;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use http::header::AUTHORIZATION;
use http::StatusCode;
use tracing::{error, info};

use crate::auth::gate::AuthContext;
use crate::server::response::ApiError;
use crate::server::server::AppState;
use crate::storage::StoreError;
use crate::users::password::{hash_password_blocking, verify_password_blocking};
use crate::users::validation::{LoginRequest, SignupRequest};
use crate::users::StoredUser;

/// `POST /signup`. An unparsable body counts as an empty one.
pub async fn signup(State(state): State<AppState>, body: Bytes) -> Result<StatusCode, ApiError> {
    let req: SignupRequest = serde_json::from_slice(&body).unwrap_or_default();
    req.validate().map_err(ApiError::Validation)?;

    let password_hash = hash_password_blocking(req.password).await.map_err(|e| {
        error!(error = %e, "password hashing failed");
        ApiError::PasswordProcessing
    })?;

    let user = StoredUser {
        email: req.email,
        firstname: req.firstname,
        lastname: req.lastname,
        password_hash,
    };
    match state.users.insert(&user).await {
        Ok(()) => {
            info!(email = %user.email, "user signed up");
            Ok(StatusCode::CREATED)
        }
        Err(StoreError::Duplicate) => Err(ApiError::DuplicateEmail),
        Err(e) => {
            error!(error = %e, "user insert failed");
            Err(ApiError::StorageUnavailable)
        }
    }
}

/// `POST /login`. The bearer token goes out in the `Authorization` header.
pub async fn login(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let req: LoginRequest = serde_json::from_slice(&body).unwrap_or_default();

    let user = match state.users.find_by_email(&req.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(ApiError::BadCredentials),
        Err(e) => {
            error!(error = %e, "user lookup failed");
            return Err(ApiError::StorageUnavailable);
        }
    };

    let matches = verify_password_blocking(req.password, user.password_hash.clone())
        .await
        .map_err(|e| {
            error!(email = %user.email, error = %e, "password verification failed");
            ApiError::PasswordProcessing
        })?;
    if !matches {
        return Err(ApiError::BadCredentials);
    }

    let issued = state.tokens.issue(&user.identity()).map_err(|e| {
        error!(error = %e, "token signing failed");
        ApiError::TokenGeneration
    })?;
    info!(email = %user.email, jti = %issued.claims.jti, "user logged in");

    Ok((
        StatusCode::OK,
        [(AUTHORIZATION, format!("Bearer {}", issued.raw))],
    )
        .into_response())
}

/// `POST|DELETE /logout`. Always 200 once the token was admitted; a failed
/// revocation is only logged.
pub async fn logout(State(state): State<AppState>, Extension(ctx): Extension<AuthContext>) -> StatusCode {
    if let Err(e) = state.auth.logout(&ctx).await {
        error!(jti = %ctx.claims.jti, error = %e, "token could not be revoked");
    }
    StatusCode::OK
}
