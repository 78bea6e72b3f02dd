//! Configuration validation with aggregated errors.
//! - Aggregates all issues into Vec<String>
//! - Validates:
//!   * signing secret and token lifetime
//!   * collaborator endpoints (storage, cache, ads)
//!   * timeout budget: every external call must finish before the request deadline
//!   * metrics path and logging level

use reqwest::Url;
use tracing::{error, info};

use crate::config::settings::{
    AdsConfig, AuthConfig, CacheConfig, ServiceConfig, SettingsConfig, StorageConfig,
};
use crate::observability::metrics::get_metrics;
use crate::utils::constants::MIN_TOKEN_SECRET_BYTES;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Public entrypoint: returns Ok(()) or Err(Vec<String>) containing all issues.
pub async fn validate_service_config(cfg: &ServiceConfig) -> Result<(), Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    validate_settings(&cfg.settings, &mut errors);
    validate_auth(&cfg.auth, &mut errors);
    validate_storage(&cfg.storage, &cfg.settings, &mut errors);
    validate_cache(&cfg.cache, &cfg.settings, &mut errors);
    validate_ads(&cfg.ads, &cfg.settings, &mut errors);

    if errors.is_empty() {
        info!("config is valid");
        Ok(())
    } else {
        let metrics = get_metrics().await;
        for e in &errors {
            error!("config validation: {}", e);
            metrics.config_validation_errors.inc();
        }
        Err(errors)
    }
}

fn validate_settings(settings: &SettingsConfig, errors: &mut Vec<String>) {
    if settings.server.host.trim().is_empty() {
        errors.push("settings.server.host must not be empty".to_string());
    }
    if settings.server.request_timeout_seconds == 0 {
        errors.push("settings.server.request_timeout_seconds must be greater than 0".to_string());
    }
    if settings.metrics.is_enabled && !settings.metrics.path.starts_with('/') {
        errors.push(format!(
            "settings.metrics.path '{}' must start with '/'",
            settings.metrics.path
        ));
    }
    if let Some(logging) = &settings.logging {
        if !LOG_LEVELS.contains(&logging.level.to_lowercase().as_str()) {
            errors.push(format!(
                "settings.logging.level '{}' is not one of {:?}",
                logging.level, LOG_LEVELS
            ));
        }
    }
}

fn validate_auth(auth: &AuthConfig, errors: &mut Vec<String>) {
    if auth.token_secret.is_empty() {
        errors.push("auth.token_secret is empty (is TOKEN_SECRET set?)".to_string());
    } else if auth.token_secret.len() < MIN_TOKEN_SECRET_BYTES {
        errors.push(format!(
            "auth.token_secret must be at least {} bytes",
            MIN_TOKEN_SECRET_BYTES
        ));
    }
    if auth.token_lifetime_seconds == 0 {
        errors.push("auth.token_lifetime_seconds must be greater than 0".to_string());
    }
}

fn validate_storage(storage: &StorageConfig, settings: &SettingsConfig, errors: &mut Vec<String>) {
    if storage.url.trim().is_empty() {
        errors.push("storage.url is empty (is DATABASE_URL set?)".to_string());
    }
    if storage.max_connections == 0 {
        errors.push("storage.max_connections must be greater than 0".to_string());
    }
    validate_timeout("storage.timeout_ms", storage.timeout_ms, settings, errors);
}

fn validate_cache(cache: &CacheConfig, settings: &SettingsConfig, errors: &mut Vec<String>) {
    if cache.url.trim().is_empty() {
        errors.push("cache.url is empty (is REDIS_ADDRESS set?)".to_string());
    }
    if cache.record_ttl_seconds == Some(0) {
        errors.push("cache.record_ttl_seconds must be greater than 0 when set".to_string());
    }
    validate_timeout("cache.timeout_ms", cache.timeout_ms, settings, errors);
}

fn validate_ads(ads: &AdsConfig, settings: &SettingsConfig, errors: &mut Vec<String>) {
    match Url::parse(&ads.base_url) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {
            if url.cannot_be_a_base() {
                errors.push(format!("ads.base_url '{}' cannot be used as a base url", ads.base_url));
            }
        }
        Ok(url) => errors.push(format!(
            "ads.base_url '{}' has unsupported scheme '{}'",
            ads.base_url,
            url.scheme()
        )),
        Err(e) => errors.push(format!("ads.base_url '{}' is invalid: {}", ads.base_url, e)),
    }
    validate_timeout("ads.timeout_ms", ads.timeout_ms, settings, errors);
}

fn validate_timeout(name: &str, timeout_ms: u64, settings: &SettingsConfig, errors: &mut Vec<String>) {
    if timeout_ms == 0 {
        errors.push(format!("{} must be greater than 0", name));
    } else if timeout_ms >= settings.server.request_timeout_seconds.saturating_mul(1000) {
        errors.push(format!(
            "{} ({}ms) must be lower than settings.server.request_timeout_seconds ({}s)",
            name, timeout_ms, settings.server.request_timeout_seconds
        ));
    }
}
