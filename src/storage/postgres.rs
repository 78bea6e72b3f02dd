use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;

use crate::config::settings::StorageConfig;
use crate::storage::StoreError;
use crate::streams::record::{Captions, StreamRecord};
use crate::streams::RecordStore;
use crate::users::{StoredUser, UserStore};

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS streams (
        id TEXT PRIMARY KEY,
        stream_url TEXT NOT NULL,
        captions JSONB NOT NULL DEFAULT '{}'::jsonb
    )",
    "CREATE TABLE IF NOT EXISTS users (
        email TEXT PRIMARY KEY,
        firstname TEXT NOT NULL,
        lastname TEXT NOT NULL,
        password_hash TEXT NOT NULL
    )",
];

/// PostgreSQL backed record and user store. Every query runs under the
/// configured storage timeout.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub async fn connect(cfg: &StorageConfig) -> Result<Self> {
        let timeout = Duration::from_millis(cfg.timeout_ms);
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .acquire_timeout(timeout)
            .connect(&cfg.url)
            .await
            .context("failed to connect to postgres")?;
        info!(max_connections = cfg.max_connections, "postgres pool ready");
        Ok(Self { pool, timeout })
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("failed to ensure schema")?;
        }
        Ok(())
    }

    async fn bounded<T, F>(&self, query: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, query).await {
            Ok(res) => res.map_err(classify),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Backend(err.to_string()),
    }
}

#[async_trait]
impl RecordStore for PgStore {
    async fn find_by_id(&self, id: &str) -> Result<StreamRecord, StoreError> {
        let row = self
            .bounded(
                sqlx::query_as::<_, (String, String, Json<Captions>)>(
                    "SELECT id, stream_url, captions FROM streams WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.pool),
            )
            .await?;

        let (id, stream_url, Json(captions)) = row.ok_or(StoreError::NotFound)?;
        Ok(StreamRecord { id, stream_url, captions })
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert(&self, user: &StoredUser) -> Result<(), StoreError> {
        self.bounded(
            sqlx::query(
                "INSERT INTO users (email, firstname, lastname, password_hash) VALUES ($1, $2, $3, $4)",
            )
            .bind(&user.email)
            .bind(&user.firstname)
            .bind(&user.lastname)
            .bind(&user.password_hash)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<StoredUser, StoreError> {
        let row = self
            .bounded(
                sqlx::query_as::<_, (String, String, String, String)>(
                    "SELECT email, firstname, lastname, password_hash FROM users WHERE email = $1",
                )
                .bind(email)
                .fetch_optional(&self.pool),
            )
            .await?;

        let (email, firstname, lastname, password_hash) = row.ok_or(StoreError::NotFound)?;
        Ok(StoredUser { email, firstname, lastname, password_hash })
    }
}
