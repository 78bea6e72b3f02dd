use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Query, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::header::{AUTHORIZATION, COOKIE};
use http::{HeaderMap, Uri};
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::auth::revocation::{RevocationError, RevocationStore};
use crate::auth::token_service::{Claims, TokenService, VerificationError};
use crate::config::settings::RevocationFailurePolicy;
use crate::helpers::time::remaining_lifetime;
use crate::observability::metrics::get_metrics;
use crate::server::response::ApiError;
use crate::server::server::AppState;
use crate::utils::constants::{BEARER_SCHEME, TOKEN_COOKIE_NAME, TOKEN_QUERY_PARAM};

/// Verified identity attached to admitted requests.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub claims: Claims,
    pub raw_token: String,
}

/// Why a request was turned away. Display strings are client facing.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no token found")]
    NoToken,
    #[error(transparent)]
    Invalid(#[from] VerificationError),
    #[error("token no longer valid")]
    Revoked,
    #[error("caching error (something wrong on our end)")]
    RevocationUnavailable,
}

impl AuthError {
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::NoToken => "no_token",
            AuthError::Invalid(e) => e.reason(),
            AuthError::Revoked => "revoked",
            AuthError::RevocationUnavailable => "revocation_unavailable",
        }
    }
}

/// Request gatekeeper: bearer extraction, signature/expiry check, then the
/// revocation list.
///
/// ```text
/// NoToken -> TokenPresent -> Verified | Rejected -> Admitted | Rejected
/// ```
pub struct AuthGate {
    tokens: Arc<TokenService>,
    revocations: RevocationStore,
    policy: RevocationFailurePolicy,
}

impl AuthGate {
    pub fn new(
        tokens: Arc<TokenService>,
        revocations: RevocationStore,
        policy: RevocationFailurePolicy,
    ) -> Self {
        Self { tokens, revocations, policy }
    }

    pub async fn admit(&self, headers: &HeaderMap, uri: &Uri) -> Result<AuthContext, AuthError> {
        let raw_token = extract_bearer(headers, uri).ok_or(AuthError::NoToken)?;
        let claims = self.tokens.verify(&raw_token)?;

        match self.revocations.is_revoked(&claims.jti).await {
            Ok(true) => Err(AuthError::Revoked),
            Ok(false) => Ok(AuthContext { claims, raw_token }),
            Err(e) => {
                get_metrics().await.revocation_check_failures.inc();
                match self.policy {
                    RevocationFailurePolicy::FailOpen => {
                        error!(jti = %claims.jti, error = %e, "revocation check failed, admitting (fail_open)");
                        Ok(AuthContext { claims, raw_token })
                    }
                    RevocationFailurePolicy::FailClosed => {
                        error!(jti = %claims.jti, error = %e, "revocation check failed, rejecting (fail_closed)");
                        Err(AuthError::RevocationUnavailable)
                    }
                }
            }
        }
    }

    /// Revoke the session behind `ctx` for whatever lifetime it has left.
    pub async fn logout(&self, ctx: &AuthContext) -> Result<Duration, RevocationError> {
        let remaining = remaining_lifetime(ctx.claims.exp);
        self.revocations.revoke(&ctx.claims.jti, remaining).await?;
        get_metrics().await.revocations.inc();
        Ok(remaining)
    }
}

/// Bearer token from the `Authorization` header, the `jwt` query parameter or
/// the `jwt` cookie, in that order. First present source wins.
pub fn extract_bearer(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    token_from_header(headers)
        .or_else(|| token_from_query(uri))
        .or_else(|| token_from_cookie(headers))
}

fn token_from_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case(BEARER_SCHEME) && !token.is_empty()).then(|| token.to_owned())
}

fn token_from_query(uri: &Uri) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params
        .get(TOKEN_QUERY_PARAM)
        .filter(|token| !token.is_empty())
        .cloned()
}

fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, token)| *name == TOKEN_COOKIE_NAME && !token.is_empty())
        .map(|(_, token)| token.to_owned())
}

/// Axum middleware guarding the authenticated routes.
pub async fn require_bearer(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match state.auth.admit(req.headers(), req.uri()).await {
        Ok(ctx) => {
            debug!(jti = %ctx.claims.jti, sub = %ctx.claims.sub, "request admitted");
            req.extensions_mut().insert(ctx);
            next.run(req).await
        }
        Err(e) => {
            get_metrics()
                .await
                .auth_rejections
                .with_label_values(&[e.reason()])
                .inc();
            warn!(reason = e.reason(), "request rejected: {}", e);
            ApiError::from(e).into_response()
        }
    }
}
