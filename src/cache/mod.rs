//! Key/value cache access.
//!
//! `kv_store` is the raw get/set/exists/ttl contract and its Redis backend,
//! `record_cache` is the cache-aside view used for composed stream payloads.

pub mod kv_store;
pub mod record_cache;

pub use kv_store::{CacheError, KeyValueCache, RedisCache};
pub use record_cache::{Lookup, RecordCache};
