use std::fmt;
use std::time::Duration;

use serde::Deserialize;

use crate::utils::constants::{
    DEFAULT_ADS_TIMEOUT_MS, DEFAULT_CACHE_TIMEOUT_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_STORAGE_TIMEOUT_MS, DEFAULT_TOKEN_LIFETIME_SECS,
};

/// ================================
/// Full service configuration
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub settings: SettingsConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub cache: CacheConfig,
    pub ads: AdsConfig,
}

/// ================================
/// Global service-wide settings
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct SettingsConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// overall per-request deadline, every external call timeout must stay below it
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_path")]
    pub path: String,
    #[serde(default)]
    pub is_enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { path: default_metrics_path(), is_enabled: false }
    }
}

/// ================================
/// Logging
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String, // allowed: trace, debug, info, warn, error
    pub format: LogFormat,
}

impl LoggingConfig {
    pub fn new (level: String, format: LogFormat) -> Self {
        Self { level, format }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Compact,
}

/// ================================
/// Auth
/// ================================
#[derive(Deserialize, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret, usually `${TOKEN_SECRET}`
    pub token_secret: String,
    #[serde(default = "default_token_lifetime_seconds")]
    pub token_lifetime_seconds: u64,
    #[serde(default)]
    pub revocation_failure_policy: RevocationFailurePolicy,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &"<redacted>")
            .field("token_lifetime_seconds", &self.token_lifetime_seconds)
            .field("revocation_failure_policy", &self.revocation_failure_policy)
            .finish()
    }
}

/// What the auth gate does when the revocation list cannot be consulted.
///
/// `FailOpen` keeps serving during a cache outage at the cost of letting
/// revoked tokens through until the cache is back.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RevocationFailurePolicy {
    #[default]
    FailOpen,
    FailClosed,
}

/// ================================
/// External collaborators
/// ================================
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// postgres connection string
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_storage_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// redis connection string
    pub url: String,
    #[serde(default = "default_cache_timeout_ms")]
    pub timeout_ms: u64,
    /// TTL of composed stream payloads; unset keeps them until evicted
    pub record_ttl_seconds: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AdsConfig {
    pub base_url: String,
    #[serde(default = "default_ads_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_request_timeout_seconds() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_token_lifetime_seconds() -> u64 {
    DEFAULT_TOKEN_LIFETIME_SECS
}

fn default_max_connections() -> u32 {
    5
}

fn default_storage_timeout_ms() -> u64 {
    DEFAULT_STORAGE_TIMEOUT_MS
}

fn default_cache_timeout_ms() -> u64 {
    DEFAULT_CACHE_TIMEOUT_MS
}

fn default_ads_timeout_ms() -> u64 {
    DEFAULT_ADS_TIMEOUT_MS
}
