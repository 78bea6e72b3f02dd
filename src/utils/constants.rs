//! Shared constants and invariants

pub const DEFAULT_CONFIG_PATH: &str = "discovery-streams.yaml";

// Timeouts for external collaborators
pub const DEFAULT_STORAGE_TIMEOUT_MS: u64 = 5000;
pub const DEFAULT_CACHE_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_ADS_TIMEOUT_MS: u64 = 3000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

// Tokens
pub const DEFAULT_TOKEN_LIFETIME_SECS: u64 = 3600;
pub const MIN_TOKEN_SECRET_BYTES: usize = 16;
/// revocation entries never get a TTL below this, even for already expired tokens
pub const MIN_REVOCATION_TTL_SECS: u64 = 1;

// Bearer token sources
pub const TOKEN_QUERY_PARAM: &str = "jwt";
pub const TOKEN_COOKIE_NAME: &str = "jwt";
pub const BEARER_SCHEME: &str = "BEARER";

// Cache key namespaces
pub const REVOKED_KEY_PREFIX: &str = "revoked:";
pub const STREAM_KEY_PREFIX: &str = "stream:";

pub const REQUEST_ID_HEADER: &str = "x-request-id";
