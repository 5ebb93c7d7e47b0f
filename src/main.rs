mod app;
mod errors;
mod external;
mod logging;
mod models;
mod routes;
mod services;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use crate::external::exchangerateapi::ExchangeRateApiProvider;
use crate::external::fallback::{RateTableChain, SpotPriceChain, TimeSeriesChain};
use crate::external::goldapi::GoldApiProvider;
use crate::external::islamicapi::IslamicApiProvider;
use crate::external::metalpriceapi::MetalPriceApiProvider;
use crate::services::{ExchangeRatesCache, HistoricalCache, MetalsCache};
use crate::state::AppState;
use crate::store::{KeyValueStore, MemoryStore, RedisStore, SharedCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    logging::init_logging(logging::LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    let store: Arc<dyn KeyValueStore> = match std::env::var("STORAGE_REDIS_URL") {
        Ok(url) => {
            tracing::info!("Using shared Redis cache store");
            Arc::new(
                RedisStore::connect(&url)
                    .await
                    .map_err(|e| anyhow::anyhow!("failed to connect to Redis: {e}"))?,
            )
        }
        Err(_) => {
            // Single-instance development fallback; the staleness check
            // is only shared across instances with Redis.
            tracing::warn!("STORAGE_REDIS_URL not set, using in-process cache store");
            Arc::new(MemoryStore::new())
        }
    };
    let cache = SharedCache::new(store);

    // Spot chain in priority order. A missing credential drops that one
    // adapter from the chain; the others still run.
    let mut spot_providers: Vec<Box<dyn external::provider::SpotPriceProvider>> = Vec::new();
    match MetalPriceApiProvider::from_env() {
        Ok(provider) => spot_providers.push(Box::new(provider)),
        Err(e) => tracing::warn!("metalpriceapi disabled: {e}"),
    }
    match GoldApiProvider::from_env() {
        Ok(provider) => spot_providers.push(Box::new(provider)),
        Err(e) => tracing::warn!("goldapi disabled: {e}"),
    }
    match IslamicApiProvider::from_env() {
        Ok(provider) => spot_providers.push(Box::new(provider)),
        Err(e) => tracing::warn!("islamicapi disabled: {e}"),
    }
    tracing::info!("📊 Spot price chain has {} provider(s)", spot_providers.len());

    let mut rate_providers: Vec<Box<dyn external::provider::RateTableProvider>> = Vec::new();
    match ExchangeRateApiProvider::from_env() {
        Ok(provider) => rate_providers.push(Box::new(provider)),
        Err(e) => tracing::warn!("exchangerate-api disabled: {e}"),
    }

    let mut series_providers: Vec<Box<dyn external::provider::TimeSeriesProvider>> = Vec::new();
    match MetalPriceApiProvider::from_env() {
        Ok(provider) => series_providers.push(Box::new(provider)),
        Err(e) => tracing::warn!("metalpriceapi timeframe disabled: {e}"),
    }

    let cron_secret = std::env::var("CRON_SECRET")
        .map_err(|_| anyhow::anyhow!("CRON_SECRET must be set"))?;

    let state = AppState {
        metals: MetalsCache::new(cache.clone(), Arc::new(SpotPriceChain::new(spot_providers))),
        exchange_rates: ExchangeRatesCache::new(
            cache.clone(),
            Arc::new(RateTableChain::new(rate_providers)),
        ),
        historical: HistoricalCache::new(
            cache.clone(),
            Arc::new(TimeSeriesChain::new(series_providers)),
        ),
        cron_secret,
    };
    let app = app::create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("🚀 Nisab backend running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
