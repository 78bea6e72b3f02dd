use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::Router;
use tracing::{error, info};

use crate::auth::gate::{require_bearer, AuthGate};
use crate::auth::revocation::RevocationStore;
use crate::auth::token_service::TokenService;
use crate::cache::kv_store::KeyValueCache;
use crate::cache::record_cache::RecordCache;
use crate::config::settings::{ServiceConfig, SettingsConfig};
use crate::observability::metrics::{get_metrics, Metrics};
use crate::observability::routes::MetricsState;
use crate::server::request_log::{enforce_deadline, log_requests};
use crate::server::response::ApiError;
use crate::server::{streams, users};
use crate::streams::{AdsSource, CompositionEngine, RecordStore};
use crate::users::UserStore;

/// Shared, immutable request state. Built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub metrics_state: MetricsState,
    pub auth: Arc<AuthGate>,
    pub tokens: Arc<TokenService>,
    pub users: Arc<dyn UserStore>,
    pub streams: Arc<CompositionEngine>,
}

/// External systems the gateway talks to.
pub struct Collaborators {
    pub cache: Arc<dyn KeyValueCache>,
    pub records: Arc<dyn RecordStore>,
    pub users: Arc<dyn UserStore>,
    pub ads: Arc<dyn AdsSource>,
}

impl AppState {
    pub fn new(metrics: &Metrics, cfg: &ServiceConfig, deps: Collaborators) -> Self {
        let tokens = Arc::new(TokenService::from_config(&cfg.auth));
        let auth = AuthGate::new(
            tokens.clone(),
            RevocationStore::new(deps.cache.clone()),
            cfg.auth.revocation_failure_policy,
        );
        let record_cache = RecordCache::new(
            deps.cache,
            cfg.cache.record_ttl_seconds.map(Duration::from_secs),
        );

        Self {
            metrics_state: MetricsState::new(metrics.registry.clone()),
            auth: Arc::new(auth),
            tokens,
            users: deps.users,
            streams: Arc::new(CompositionEngine::new(deps.records, deps.ads, record_cache)),
        }
    }
}

/// Public routes, bearer-guarded routes and the metrics endpoint, wrapped in
/// the request deadline and the request log.
pub fn router(state: AppState, settings_config: &SettingsConfig) -> Router {
    let guarded = Router::new()
        .route("/logout", post(users::logout).delete(users::logout))
        .route("/v1/streams/{id}", get(streams::get_stream))
        .route_layer(from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/login", post(users::login))
        .route("/signup", post(users::signup))
        .merge(guarded)
        .merge(state.metrics_state.router(&settings_config.metrics))
        .fallback(|| async { ApiError::RouteNotFound })
        .layer(from_fn_with_state(
            settings_config.server.request_timeout(),
            enforce_deadline,
        ))
        .layer(from_fn(log_requests))
        .with_state(state)
}

/// Serve until Ctrl-C or SIGTERM, then drain in-flight requests.
pub async fn start(service_config: &ServiceConfig, state: AppState) -> Result<()> {
    let metrics = get_metrics().await;
    let settings_config = &service_config.settings;
    let app = router(state, settings_config);

    let bind_addr = format!("{}:{}", settings_config.server.host, settings_config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!("listening on {}", bind_addr);

    metrics.up.set(1);
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;
    metrics.up.set(0);

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
