//! # Discovery Streams
//!
//! Authenticated gateway serving per-id stream records: the manifest URL and
//! captions kept in storage, merged with live ad metadata, cached as composed
//! JSON. Sessions are HS256 bearer tokens with a Redis backed revocation list.
//!
//! Modules:
//! - `auth`: token issuing/verification, revocation list, request gate
//! - `cache`: key/value cache contract, Redis backend, composed payload cache
//! - `streams`: stream records, ad metadata client, payload composition
//! - `users`: signup validation, password hashing, account store contract
//! - `storage`: PostgreSQL backend for records and accounts
//! - `server`: axum router, handlers, error envelope, request middleware
//! - `config`: YAML configuration, env expansion, validation

pub mod auth;
pub mod cache;
pub mod config;
pub mod helpers;
pub mod observability;
pub mod server;
pub mod storage;
pub mod streams;
pub mod users;
pub mod utils;

#[cfg(test)]
mod tests;
