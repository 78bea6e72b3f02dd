use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use discovery_streams::cache::RedisCache;
use discovery_streams::observability::metrics::get_metrics;
use discovery_streams::server::server::{self, AppState, Collaborators};
use discovery_streams::storage::PgStore;
use discovery_streams::streams::HttpAdsClient;
use discovery_streams::utils::config_loader;
use discovery_streams::utils::constants::DEFAULT_CONFIG_PATH;
use discovery_streams::utils::logging;
use discovery_streams::utils::logging::LogLevel;
use reqwest::Client;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, start logging
    // -------------------------------

    let args = Args::parse();
    let service_config = config_loader::run(&args.config).await?;
    logging::run(&service_config, args.log_level).await?;

    // -------------------------------
    // 2. Connect collaborators
    // -------------------------------

    let store = PgStore::connect(&service_config.storage).await?;
    store.ensure_schema().await?;
    let store = Arc::new(store);

    let cache = RedisCache::connect(
        &service_config.cache.url,
        Duration::from_millis(service_config.cache.timeout_ms),
    )
    .await?;

    let client = Client::builder()
        .build()
        .context("failed to build http client")?;
    let ads = HttpAdsClient::new(
        client,
        &service_config.ads.base_url,
        Duration::from_millis(service_config.ads.timeout_ms),
    )?;

    // -------------------------------
    // 3. Start http server
    // -------------------------------

    let state = AppState::new(
        get_metrics().await,
        &service_config,
        Collaborators {
            cache: Arc::new(cache),
            records: store.clone(),
            users: store,
            ads: Arc::new(ads),
        },
    );

    info!("Service starting...");
    server::start(&service_config, state).await
}
