use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::helpers::time::get_instant;
use crate::observability::metrics::get_metrics;

#[derive(Debug, Error)]
pub enum AdsError {
    #[error("ads request timed out after {0:?}")]
    Timeout(Duration),
    #[error("ads request failed: {0}")]
    Transport(String),
    #[error("ads service returned {status} from {url}")]
    Status { status: u16, url: String },
    #[error("ads response is not json: {0}")]
    Body(String),
    #[error("cannot build ads url for '{0}'")]
    Url(String),
}

/// Live, per-id ad metadata.
#[async_trait]
pub trait AdsSource: Send + Sync {
    async fn fetch(&self, id: &str) -> Result<Value, AdsError>;
}

/// `GET <base_url>/<id>` against the ad metadata service.
#[derive(Debug, Clone)]
pub struct HttpAdsClient {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpAdsClient {
    pub fn new(client: Client, base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(anyhow!("ads base url '{}' cannot carry a path", base_url));
        }
        Ok(Self { client, base_url, timeout })
    }

    /// The id becomes one percent-encoded path segment, so it can never
    /// escape the configured base path.
    pub fn url_for(&self, id: &str) -> Result<Url, AdsError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AdsError::Url(id.to_owned()))?
            .pop_if_empty()
            .push(id);
        Ok(url)
    }

    async fn request(&self, url: Url) -> Result<Value, AdsError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdsError::Status { status: status.as_u16(), url: url.to_string() });
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        serde_json::from_slice(&body).map_err(|e| AdsError::Body(e.to_string()))
    }

    fn classify(&self, err: reqwest::Error) -> AdsError {
        if err.is_timeout() {
            AdsError::Timeout(self.timeout)
        } else {
            AdsError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl AdsSource for HttpAdsClient {
    async fn fetch(&self, id: &str) -> Result<Value, AdsError> {
        let url = self.url_for(id)?;
        debug!(stream_id = %id, %url, "fetching ad metadata");

        let started = get_instant();
        let result = self.request(url).await;
        let outcome = if result.is_ok() { "ok" } else { "error" };
        get_metrics()
            .await
            .ads_fetch_duration
            .with_label_values(&[outcome])
            .observe(started.elapsed().as_secs_f64());
        result
    }
}
