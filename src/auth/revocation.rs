use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use crate::cache::kv_store::{CacheError, KeyValueCache};
use crate::utils::constants::{MIN_REVOCATION_TTL_SECS, REVOKED_KEY_PREFIX};

static REVOKED_MARKER: &[u8] = b"1";

#[derive(Debug, Error)]
pub enum RevocationError {
    #[error("revocation store unavailable: {0}")]
    Unavailable(#[from] CacheError),
}

/// Revocation list keyed by token id.
///
/// Entries carry the revoked token's remaining lifetime as TTL and are only
/// ever removed by expiry, so the list is bounded by the live sessions.
#[derive(Clone)]
pub struct RevocationStore {
    cache: Arc<dyn KeyValueCache>,
}

impl RevocationStore {
    pub fn new(cache: Arc<dyn KeyValueCache>) -> Self {
        Self { cache }
    }

    /// A non-positive `remaining` is stored with the minimal TTL.
    pub async fn revoke(&self, token_id: &str, remaining: Duration) -> Result<(), RevocationError> {
        let ttl = remaining.max(Duration::from_secs(MIN_REVOCATION_TTL_SECS));
        self.cache
            .set(&revoked_key(token_id), REVOKED_MARKER, Some(ttl))
            .await?;
        info!(jti = %token_id, ttl = ttl.as_secs(), "token revoked");
        Ok(())
    }

    /// A missing entry means "not revoked"; only store failures are errors.
    pub async fn is_revoked(&self, token_id: &str) -> Result<bool, RevocationError> {
        Ok(self.cache.exists(&revoked_key(token_id)).await?)
    }

    /// Time left on a revocation entry.
    pub async fn remaining(&self, token_id: &str) -> Result<Option<Duration>, RevocationError> {
        Ok(self.cache.ttl(&revoked_key(token_id)).await?)
    }
}

fn revoked_key(token_id: &str) -> String {
    format!("{}{}", REVOKED_KEY_PREFIX, token_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::MemoryCache;

    #[tokio::test]
    async fn revoked_token_is_reported_until_expiry() {
        let cache = Arc::new(MemoryCache::default());
        let store = RevocationStore::new(cache.clone());

        assert!(!store.is_revoked("jti-1").await.unwrap());
        store.revoke("jti-1", Duration::from_secs(1)).await.unwrap();
        assert!(store.is_revoked("jti-1").await.unwrap());
        assert!(!store.is_revoked("jti-2").await.unwrap());

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!store.is_revoked("jti-1").await.unwrap());
    }

    #[tokio::test]
    async fn entry_never_outlives_the_token() {
        let cache = Arc::new(MemoryCache::default());
        let store = RevocationStore::new(cache);

        store.revoke("jti-1", Duration::from_secs(600)).await.unwrap();
        let left = store.remaining("jti-1").await.unwrap().expect("entry has a ttl");
        assert!(left <= Duration::from_secs(600));
    }

    #[tokio::test]
    async fn zero_remaining_lifetime_is_clamped() {
        let cache = Arc::new(MemoryCache::default());
        let store = RevocationStore::new(cache);

        store.revoke("jti-1", Duration::ZERO).await.unwrap();
        assert!(store.is_revoked("jti-1").await.unwrap());
        let left = store.remaining("jti-1").await.unwrap().expect("entry has a ttl");
        assert!(left <= Duration::from_secs(MIN_REVOCATION_TTL_SECS));
    }

    #[tokio::test]
    async fn store_failure_is_a_distinct_signal() {
        let cache = Arc::new(MemoryCache::default());
        cache.set_unavailable(true);
        let store = RevocationStore::new(cache);

        assert!(matches!(
            store.is_revoked("jti-1").await,
            Err(RevocationError::Unavailable(_))
        ));
        assert!(store.revoke("jti-1", Duration::from_secs(10)).await.is_err());
    }
}
