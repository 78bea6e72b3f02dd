//! Persistent storage for stream records and user accounts.

pub mod postgres;

use std::time::Duration;

use thiserror::Error;

pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no matching row")]
    NotFound,
    #[error("unique constraint violated")]
    Duplicate,
    #[error("storage call timed out after {0:?}")]
    Timeout(Duration),
    #[error("storage backend error: {0}")]
    Backend(String),
}
