use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::cache::kv_store::KeyValueCache;
use crate::observability::metrics::get_metrics;
use crate::utils::constants::STREAM_KEY_PREFIX;

static HIT_MSG: &str = "hit";
static MISS_MSG: &str = "miss";
static ERROR_MSG: &str = "error";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// pre-composed payload, served byte for byte
    Hit(Vec<u8>),
    Miss,
}

/// Cache-aside view over composed stream payloads.
///
/// The cache never fails a request: read errors degrade to `Miss`, write
/// errors are logged and dropped.
#[derive(Clone)]
pub struct RecordCache {
    cache: Arc<dyn KeyValueCache>,
    ttl: Option<Duration>,
}

impl RecordCache {
    pub fn new(cache: Arc<dyn KeyValueCache>, ttl: Option<Duration>) -> Self {
        Self { cache, ttl }
    }

    pub async fn get(&self, id: &str) -> Lookup {
        let metrics = get_metrics().await;
        match self.cache.get(&record_key(id)).await {
            Ok(Some(payload)) if !payload.is_empty() => {
                debug!(stream_id = %id, "record cache hit");
                metrics.record_cache_lookups.with_label_values(&[HIT_MSG]).inc();
                Lookup::Hit(payload)
            }
            Ok(_) => {
                metrics.record_cache_lookups.with_label_values(&[MISS_MSG]).inc();
                Lookup::Miss
            }
            Err(e) => {
                error!(stream_id = %id, error = %e, "record cache read failed, composing instead");
                metrics.record_cache_lookups.with_label_values(&[ERROR_MSG]).inc();
                Lookup::Miss
            }
        }
    }

    pub async fn put(&self, id: &str, payload: &[u8]) {
        if let Err(e) = self.cache.set(&record_key(id), payload, self.ttl).await {
            error!(stream_id = %id, error = %e, "record cache write failed");
            get_metrics().await.record_cache_write_failures.inc();
        }
    }
}

fn record_key(id: &str) -> String {
    format!("{}{}", STREAM_KEY_PREFIX, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::common::MemoryCache;

    #[tokio::test]
    async fn miss_then_hit_after_put() {
        let cache = Arc::new(MemoryCache::default());
        let records = RecordCache::new(cache.clone(), None);

        assert_eq!(records.get("abc").await, Lookup::Miss);
        records.put("abc", b"{\"id\":\"abc\"}").await;
        assert_eq!(records.get("abc").await, Lookup::Hit(b"{\"id\":\"abc\"}".to_vec()));
        assert!(cache.contains("stream:abc"));
    }

    #[tokio::test]
    async fn unavailable_cache_degrades_to_miss_and_swallows_writes() {
        let cache = Arc::new(MemoryCache::default());
        cache.set_unavailable(true);
        let records = RecordCache::new(cache.clone(), Some(Duration::from_secs(30)));

        records.put("abc", b"payload").await;
        assert_eq!(records.get("abc").await, Lookup::Miss);

        cache.set_unavailable(false);
        assert_eq!(records.get("abc").await, Lookup::Miss);
    }

    #[tokio::test]
    async fn empty_value_is_treated_as_miss() {
        let cache = Arc::new(MemoryCache::default());
        cache.set("stream:abc", b"", None).await.unwrap();
        let records = RecordCache::new(cache, None);

        assert_eq!(records.get("abc").await, Lookup::Miss);
    }

    #[tokio::test]
    async fn configured_ttl_is_applied_to_entries() {
        let cache = Arc::new(MemoryCache::default());
        let records = RecordCache::new(cache.clone(), Some(Duration::from_secs(90)));

        records.put("abc", b"payload").await;
        let ttl = cache.ttl("stream:abc").await.unwrap().expect("entry has a ttl");
        assert!(ttl <= Duration::from_secs(90));
        assert!(ttl > Duration::from_secs(85));
    }
}
