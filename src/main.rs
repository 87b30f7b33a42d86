use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use airwatch::api::AppState;
use airwatch::config::AirWatchConfig;
use airwatch::geocode::GeocodingResolver;
use airwatch::pollution;
use airwatch::store::RecordStore;
use airwatch::web;

fn init_tracing(config: &AirWatchConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    if config.logging.format == "json" {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AirWatchConfig::load()?;
    init_tracing(&config);

    tracing::info!(version = airwatch::VERSION, "starting AirWatch");

    let store = RecordStore::connect(&config.database.url).await?;

    let api_key = if config.has_pollution_credential() {
        config.providers.openweathermap_api_key.clone()
    } else {
        None
    };

    let resolver = GeocodingResolver::new(
        api_key.clone(),
        Duration::from_secs(config.providers.geocode_timeout_seconds),
    )?;

    let pollution = pollution::provider_from_config(
        api_key.as_deref(),
        Duration::from_secs(config.providers.fetch_timeout_seconds),
    )?;

    let state = Arc::new(AppState {
        store,
        resolver,
        pollution,
    });

    web::run(config.server.port, state).await
}
