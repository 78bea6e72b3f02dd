use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Extension;
use http::header::CONTENT_TYPE;
use tracing::debug;

use crate::auth::gate::AuthContext;
use crate::server::response::ApiError;
use crate::server::server::AppState;

/// `GET /v1/streams/{id}`; the payload bytes are served exactly as cached or composed.
pub async fn get_stream(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    debug!(stream_id = %id, sub = %ctx.claims.sub, "stream requested");
    let payload = state.streams.fetch(&id).await?;
    Ok(([(CONTENT_TYPE, "application/json")], payload).into_response())
}
