use crate::models::{HistoricalPoint, PriceSource};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;
use std::time::Duration;

/// Canonical mass conversion for precious-metal quotes.
pub const TROY_OUNCE_TO_GRAMS: f64 = 31.103_476_8;

/// Per-request timeout applied to every outbound provider call so a
/// hanging API cannot stall the whole fallback chain.
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Round a per-gram price to the 4 decimal places used in the cache.
pub fn round_price(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Shared HTTP client settings for all adapters.
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(PROVIDER_TIMEOUT)
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

/// A normalized spot observation: USD per gram for both metals.
#[derive(Debug, Clone)]
pub struct SpotQuote {
    pub gold_price_per_gram: f64,
    pub silver_price_per_gram: f64,
    pub as_of: DateTime<Utc>,
    pub source: PriceSource,
}

/// Every way an adapter can fail collapses into one of these; the
/// orchestrator treats them all as "this adapter is unavailable" and moves
/// on to the next one.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("missing configuration: {0}")]
    MissingConfig(String),

    #[error("no provider available")]
    Exhausted,
}

#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    async fn fetch_spot_prices(&self) -> Result<SpotQuote, ProviderError>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait RateTableProvider: Send + Sync {
    async fn fetch_rate_table(
        &self,
    ) -> Result<crate::models::ExchangeRatesSnapshot, ProviderError>;

    fn name(&self) -> &'static str;
}

#[async_trait]
pub trait TimeSeriesProvider: Send + Sync {
    /// Fetch one point per calendar day in `[start, end]`, ascending.
    async fn fetch_time_series(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalPoint>, ProviderError>;

    fn name(&self) -> &'static str;
}
