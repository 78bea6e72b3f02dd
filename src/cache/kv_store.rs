use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{Cmd, FromRedisValue};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache call timed out after {0:?}")]
    Timeout(Duration),
    #[error("cache backend error: {0}")]
    Backend(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// Minimal key/value contract the gateway needs from its cache.
///
/// A missing key is never an error: `get` yields `None`, `exists` yields `false`.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// `ttl = None` stores the value until it is evicted.
    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError>;

    async fn exists(&self, key: &str) -> Result<bool, CacheError>;

    /// Time left before `key` expires, `None` when absent or stored without expiry.
    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError>;
}

/// Redis backed cache. The connection manager is cloned per call, so no lock
/// is held while a command is in flight.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisCache {
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self> {
        let url = if url.contains("://") {
            url.to_owned()
        } else {
            format!("redis://{}", url)
        };
        let client = redis::Client::open(url.as_str()).context("failed to construct Redis client")?;
        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| anyhow!("timed out connecting to redis after {:?}", timeout))?
            .context("failed to initialize Redis connection manager")?;
        info!("redis connection manager ready");
        Ok(Self { conn, timeout })
    }

    async fn run<T: FromRedisValue>(&self, cmd: Cmd) -> Result<T, CacheError> {
        let mut conn = self.conn.clone();
        match tokio::time::timeout(self.timeout, cmd.query_async(&mut conn)).await {
            Ok(res) => res.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut cmd = redis::cmd("GET");
        cmd.arg(key);
        self.run(cmd).await
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(ttl) = ttl {
            cmd.arg("EX").arg(ttl.as_secs().max(1));
        }
        self.run(cmd).await
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        let mut cmd = redis::cmd("EXISTS");
        cmd.arg(key);
        self.run(cmd).await
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        let mut cmd = redis::cmd("TTL");
        cmd.arg(key);
        // -2: missing key, -1: no expiry
        let secs: i64 = self.run(cmd).await?;
        Ok((secs >= 0).then(|| Duration::from_secs(secs as u64)))
    }
}
