//! Stream retrieval: the persisted record, the live ad metadata and the
//! composed payload served to clients.

pub mod ads;
pub mod compose;
pub mod payload;
pub mod record;

use async_trait::async_trait;

use crate::storage::StoreError;
use record::StreamRecord;

pub use ads::{AdsError, AdsSource, HttpAdsClient};
pub use compose::{ComposeError, CompositionEngine};

/// Lookup of persisted stream records by id.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// `StoreError::NotFound` when no record carries `id`.
    async fn find_by_id(&self, id: &str) -> Result<StreamRecord, StoreError>;
}
