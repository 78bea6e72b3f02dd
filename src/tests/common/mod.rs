// Shared test support: ephemeral servers and in-memory collaborators.
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::auth::token_service::{Identity, TokenService};
use crate::cache::kv_store::{CacheError, KeyValueCache};
use crate::config::settings::ServiceConfig;
use crate::observability::metrics::get_metrics;
use crate::server::server::{router, AppState, Collaborators};
use crate::storage::StoreError;
use crate::streams::ads::{AdsError, AdsSource};
use crate::streams::record::{CaptionTrack, Captions, StreamRecord};
use crate::streams::RecordStore;
use crate::users::{StoredUser, UserStore};

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

pub const TEST_SECRET: &str = "test-secret-with-enough-bytes";

/// Minimal valid config; `ads.base_url` is only used by the HTTP ads client.
pub fn test_config(extra_auth: &str) -> ServiceConfig {
    let yaml = format!(
        r#"
settings:
  server:
    host: 127.0.0.1
    port: 0
    request_timeout_seconds: 10
  metrics:
    is_enabled: true
    path: /metrics
auth:
  token_secret: {TEST_SECRET}
  token_lifetime_seconds: 3600
  {extra_auth}
storage:
  url: postgres://localhost/streams
cache:
  url: redis://localhost:6379
ads:
  base_url: http://127.0.0.1:1/ads/
"#
    );
    serde_yaml::from_str(&yaml).expect("test config")
}

pub fn sample_record(id: &str) -> StreamRecord {
    StreamRecord {
        id: id.to_string(),
        stream_url: "https://devstreaming-cdn.apple.com/videos/streaming/examples/bipbop_4x3/bipbop_4x3_variant.m3u8".to_string(),
        captions: Captions {
            vtt: CaptionTrack { en: "https://captionslocation.com/0123456789/captions.vtt".to_string() },
            scc: CaptionTrack { en: "https://captionslocation.com/0123456789/captions.scc".to_string() },
        },
    }
}

fn unavailable() -> CacheError {
    CacheError::Backend("connection refused".to_string())
}

/// In-memory key/value cache with TTLs and a switchable outage.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Vec<u8>, Option<Instant>)>>,
    unavailable: AtomicBool,
}

impl MemoryCache {
    pub fn set_unavailable(&self, value: bool) {
        self.unavailable.store(value, Ordering::SeqCst);
    }

    /// Live entry check that bypasses the outage switch.
    pub fn contains(&self, key: &str) -> bool {
        self.live(key).is_some()
    }

    fn live(&self, key: &str) -> Option<(Vec<u8>, Option<Instant>)> {
        let mut entries = self.entries.lock().unwrap();
        let expired = matches!(
            entries.get(key),
            Some((_, Some(deadline))) if *deadline <= Instant::now()
        );
        if expired {
            entries.remove(key);
            return None;
        }
        entries.get(key).cloned()
    }

    fn check(&self) -> Result<(), CacheError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(unavailable())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        self.check()?;
        Ok(self.live(key).map(|(value, _)| value))
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<(), CacheError> {
        self.check()?;
        let deadline = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_vec(), deadline));
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        self.check()?;
        Ok(self.live(key).is_some())
    }

    async fn ttl(&self, key: &str) -> Result<Option<Duration>, CacheError> {
        self.check()?;
        Ok(self
            .live(key)
            .and_then(|(_, deadline)| deadline)
            .map(|deadline| deadline.saturating_duration_since(Instant::now())))
    }
}

#[derive(Default)]
pub struct MemoryRecordStore {
    records: Mutex<HashMap<String, StreamRecord>>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl MemoryRecordStore {
    pub fn with_records(records: Vec<StreamRecord>) -> Self {
        let store = Self::default();
        {
            let mut map = store.records.lock().unwrap();
            for record in records {
                map.insert(record.id.clone(), record);
            }
        }
        store
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, value: bool) {
        self.unavailable.store(value, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn find_by_id(&self, id: &str) -> Result<StreamRecord, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Timeout(Duration::from_millis(5000)));
        }
        self.records
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<String, StoredUser>>,
    unavailable: AtomicBool,
}

impl MemoryUserStore {
    pub fn set_unavailable(&self, value: bool) {
        self.unavailable.store(value, Ordering::SeqCst);
    }

    pub fn get(&self, email: &str) -> Option<StoredUser> {
        self.users.lock().unwrap().get(email).cloned()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: &StoredUser) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        let mut users = self.users.lock().unwrap();
        if users.contains_key(&user.email) {
            return Err(StoreError::Duplicate);
        }
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<StoredUser, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("connection reset".to_string()));
        }
        self.get(email).ok_or(StoreError::NotFound)
    }
}

/// Ads source with a fixed answer, a call counter and a switchable outage.
pub struct CountingAds {
    body: Value,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

impl CountingAds {
    pub fn returning(body: Value) -> Self {
        Self {
            body,
            calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_unavailable(&self, value: bool) {
        self.unavailable.store(value, Ordering::SeqCst);
    }
}

#[async_trait]
impl AdsSource for CountingAds {
    async fn fetch(&self, _id: &str) -> Result<Value, AdsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AdsError::Transport("connection refused".to_string()));
        }
        Ok(self.body.clone())
    }
}

/// A running gateway wired to in-memory collaborators.
pub struct TestApp {
    pub base_url: String,
    pub client: Client,
    pub cache: Arc<MemoryCache>,
    pub records: Arc<MemoryRecordStore>,
    pub users: Arc<MemoryUserStore>,
    pub handle: JoinHandle<()>,
}

impl TestApp {
    pub async fn spawn(config: ServiceConfig, records: Arc<MemoryRecordStore>, ads: Arc<dyn AdsSource>) -> Self {
        let cache = Arc::new(MemoryCache::default());
        let users = Arc::new(MemoryUserStore::default());
        let state = AppState::new(
            get_metrics().await,
            &config,
            Collaborators {
                cache: cache.clone(),
                records: records.clone(),
                users: users.clone(),
                ads,
            },
        );
        let (handle, addr) = spawn_axum(router(state, &config.settings)).await;

        Self {
            base_url: format!("http://{}", addr),
            client: build_reqwest_client(),
            cache,
            records,
            users,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn signup(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/signup"))
            .json(&json!({
                "email": email,
                "firstname": "Mister",
                "lastname": "Test",
                "password": password
            }))
            .send()
            .await
            .expect("signup request")
    }

    /// Token signed with the app's secret, without going through login.
    pub fn token(&self, email: &str) -> String {
        TokenService::new(TEST_SECRET.as_bytes(), Duration::from_secs(3600))
            .issue(&Identity {
                email: email.to_string(),
                firstname: "Mister".to_string(),
                lastname: "Test".to_string(),
            })
            .expect("token")
            .raw
    }

    /// Signs up and logs in, returning the bearer token.
    pub async fn session(&self, email: &str) -> String {
        assert_eq!(self.signup(email, "secret1").await.status(), 201);
        let resp = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "email": email, "password": "secret1" }))
            .send()
            .await
            .expect("login request");
        assert_eq!(resp.status(), 200);
        let header = resp
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .expect("authorization header");
        header.trim_start_matches("Bearer ").to_string()
    }
}
