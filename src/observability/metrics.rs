use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use tracing::info;
use std::sync::Arc;
use tokio::sync::OnceCell;


// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE.get_or_init(|| async {
        info!("Initializing Metrics ...");
        Metrics::new()}
    ).await
}


#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // HTTP surface
    pub http_requests: IntCounterVec,
    pub http_request_duration: HistogramVec,

    // Auth
    pub auth_rejections: IntCounterVec,
    pub revocations: IntCounter,
    pub revocation_check_failures: IntCounter,

    // Record cache
    pub record_cache_lookups: IntCounterVec,
    pub record_cache_write_failures: IntCounter,

    // Composition
    pub compose_failures: IntCounterVec,
    pub ads_fetch_duration: HistogramVec,

    // Config/runtime
    pub config_validation_errors: IntCounter,
    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("discoverystreams".into()), None).unwrap();

        let metrics: Arc<Metrics> = Arc::new(Self {
            // HTTP
            http_requests: IntCounterVec::new(Opts::new("http_requests_total", "Served requests by method and status"),&["method", "status"],).unwrap(),
            http_request_duration: HistogramVec::new(HistogramOpts::new("http_request_duration_seconds", "Request duration seconds").buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["method"],).unwrap(),

            // Auth
            auth_rejections: IntCounterVec::new(Opts::new("auth_rejections_total", "Rejected bearer tokens by reason"),&["reason"],).unwrap(),
            revocations: IntCounter::new("revocations_total", "Tokens revoked by logout").unwrap(),
            revocation_check_failures: IntCounter::new("revocation_check_failures_total", "Revocation lookups that failed at the cache").unwrap(),

            // Record cache
            record_cache_lookups: IntCounterVec::new(Opts::new("record_cache_lookups_total", "Record cache lookups by outcome"),&["outcome"],).unwrap(),
            record_cache_write_failures: IntCounter::new("record_cache_write_failures_total", "Composed payloads that could not be cached").unwrap(),

            // Composition
            compose_failures: IntCounterVec::new(Opts::new("compose_failures_total", "Composition failures by reason"),&["reason"],).unwrap(),
            ads_fetch_duration: HistogramVec::new(HistogramOpts::new("ads_fetch_duration_seconds", "Ad metadata fetch duration seconds").buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]),&["outcome"],).unwrap(),

            config_validation_errors: IntCounter::new("config_validation_errors_total","Validation errors during startup",).unwrap(),
            up: IntGauge::new("up", "1 if service is healthy").unwrap(),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        reg.register(Box::new(metrics.http_requests.clone())).unwrap();
        reg.register(Box::new(metrics.http_request_duration.clone())).unwrap();
        reg.register(Box::new(metrics.auth_rejections.clone())).unwrap();
        reg.register(Box::new(metrics.revocations.clone())).unwrap();
        reg.register(Box::new(metrics.revocation_check_failures.clone())).unwrap();
        reg.register(Box::new(metrics.record_cache_lookups.clone())).unwrap();
        reg.register(Box::new(metrics.record_cache_write_failures.clone())).unwrap();
        reg.register(Box::new(metrics.compose_failures.clone())).unwrap();
        reg.register(Box::new(metrics.ads_fetch_duration.clone())).unwrap();
        reg.register(Box::new(metrics.config_validation_errors.clone())).unwrap();
        reg.register(Box::new(metrics.up.clone())).unwrap();

        metrics
    }
}
