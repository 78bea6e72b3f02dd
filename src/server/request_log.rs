use std::net::SocketAddr;
use std::time::Duration;

use axum::body::HttpBody;
use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use http::{HeaderValue, Method};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;
use crate::server::response::ApiError;
use crate::utils::constants::REQUEST_ID_HEADER;

/// One log line per finished request, inside a span carrying its `req_id`
/// so handler logs can be correlated. The id is echoed as `x-request-id`.
pub async fn log_requests(req: Request, next: Next) -> Response {
    let req_id = Uuid::new_v4().to_string();
    let ip_address = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "-".to_owned());
    let protocol_version = format!("{:?}", req.version());
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let started = get_instant();

    let span = info_span!("request", req_id = %req_id);
    let mut response = next.run(req).instrument(span.clone()).await;

    let status = response.status();
    let size = response.body().size_hint().exact();
    let elapsed = started.elapsed();

    span.in_scope(|| {
        info!(
            ip_address = %ip_address,
            protocol_version = %protocol_version,
            request_method = %method,
            path = %path,
            status = status.as_u16(),
            size = ?size,
            elapsed_ms = elapsed.as_millis() as u64,
            "request completed"
        )
    });

    let label = method_label(&method);
    let metrics = get_metrics().await;
    metrics
        .http_requests
        .with_label_values(&[label, status.as_str()])
        .inc();
    metrics
        .http_request_duration
        .with_label_values(&[label])
        .observe(elapsed.as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&req_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Metric label for a request method; extension methods share one series.
fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        Method::CONNECT => "CONNECT",
        Method::PATCH => "PATCH",
        Method::TRACE => "TRACE",
        _ => "OTHER",
    }
}

/// Overall per-request deadline. Dropping the inner future abandons every
/// call still in flight, including a pending cache write.
pub async fn enforce_deadline(State(deadline): State<Duration>, req: Request, next: Next) -> Response {
    let path = req.uri().path().to_owned();
    match tokio::time::timeout(deadline, next.run(req)).await {
        Ok(response) => response,
        Err(_) => {
            warn!(path = %path, deadline_ms = deadline.as_millis() as u64, "request deadline exceeded");
            ApiError::Timeout.into_response()
        }
    }
}
