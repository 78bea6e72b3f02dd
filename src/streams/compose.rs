use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error};

use crate::cache::record_cache::{Lookup, RecordCache};
use crate::observability::metrics::get_metrics;
use crate::storage::StoreError;
use crate::streams::ads::AdsSource;
use crate::streams::payload;
use crate::streams::RecordStore;

#[derive(Debug, Error)]
pub enum ComposeError {
    #[error("no such stream exists")]
    NotFound,
    #[error("database error (something wrong on our end)")]
    PersistenceUnavailable,
    #[error("ads url metadata error")]
    UpstreamUnavailable,
}

impl ComposeError {
    pub fn reason(&self) -> &'static str {
        match self {
            ComposeError::NotFound => "not_found",
            ComposeError::PersistenceUnavailable => "storage",
            ComposeError::UpstreamUnavailable => "ads",
        }
    }
}

/// Builds stream payloads: persisted record first, then live ad metadata,
/// merged and written back to the record cache.
///
/// Nothing is retried. A payload is cached only when both parts were fetched,
/// and the write happens inside the request future, so a request abandoned
/// mid-way leaves the cache untouched.
pub struct CompositionEngine {
    store: Arc<dyn RecordStore>,
    ads: Arc<dyn AdsSource>,
    cache: RecordCache,
}

impl CompositionEngine {
    pub fn new(store: Arc<dyn RecordStore>, ads: Arc<dyn AdsSource>, cache: RecordCache) -> Self {
        Self { store, ads, cache }
    }

    /// Cached payload when present, otherwise a fresh composition.
    pub async fn fetch(&self, id: &str) -> Result<Vec<u8>, ComposeError> {
        match self.cache.get(id).await {
            Lookup::Hit(payload) => Ok(payload),
            Lookup::Miss => self.compose(id).await,
        }
    }

    pub async fn compose(&self, id: &str) -> Result<Vec<u8>, ComposeError> {
        let result = self.compose_uncached(id).await;
        match &result {
            Ok(payload) => self.cache.put(id, payload).await,
            Err(e) => {
                get_metrics()
                    .await
                    .compose_failures
                    .with_label_values(&[e.reason()])
                    .inc();
            }
        }
        result
    }

    async fn compose_uncached(&self, id: &str) -> Result<Vec<u8>, ComposeError> {
        let record = self.store.find_by_id(id).await.map_err(|e| match e {
            StoreError::NotFound => {
                debug!(stream_id = %id, "stream not found");
                ComposeError::NotFound
            }
            other => {
                error!(stream_id = %id, error = %other, "stream lookup failed");
                ComposeError::PersistenceUnavailable
            }
        })?;

        let ads = self.ads.fetch(id).await.map_err(|e| {
            error!(stream_id = %id, error = %e, "ad metadata fetch failed");
            ComposeError::UpstreamUnavailable
        })?;

        payload::render(&record, &ads).map_err(|e| {
            error!(stream_id = %id, error = %e, "payload rendering failed");
            ComposeError::UpstreamUnavailable
        })
    }
}
