use crate::external::provider::{
    ProviderError, RateTableProvider, SpotPriceProvider, SpotQuote, TimeSeriesProvider,
};
use crate::models::{ExchangeRatesSnapshot, HistoricalPoint};
use chrono::NaiveDate;
use tracing::{info, warn};

/// Priority-ordered spot-price fallback chain.
///
/// Tries each adapter in order and returns the first successful quote,
/// tagged with that adapter's source identity. No merging across
/// providers; the free tiers are unreliable enough that "first answer
/// wins" is the whole strategy. When every adapter fails the caller
/// (the cache manager) falls back to cached-then-static data.
pub struct SpotPriceChain {
    providers: Vec<Box<dyn SpotPriceProvider>>,
}

impl SpotPriceChain {
    pub fn new(providers: Vec<Box<dyn SpotPriceProvider>>) -> Self {
        Self { providers }
    }

    pub async fn acquire(&self) -> Result<SpotQuote, ProviderError> {
        for provider in &self.providers {
            match provider.fetch_spot_prices().await {
                Ok(quote) => {
                    info!("fetched spot prices from {}", provider.name());
                    return Ok(quote);
                }
                Err(e) => {
                    warn!("spot provider {} unavailable: {}", provider.name(), e);
                }
            }
        }

        Err(ProviderError::Exhausted)
    }
}

pub struct RateTableChain {
    providers: Vec<Box<dyn RateTableProvider>>,
}

impl RateTableChain {
    pub fn new(providers: Vec<Box<dyn RateTableProvider>>) -> Self {
        Self { providers }
    }

    pub async fn acquire(&self) -> Result<ExchangeRatesSnapshot, ProviderError> {
        for provider in &self.providers {
            match provider.fetch_rate_table().await {
                Ok(snapshot) => {
                    info!("fetched exchange rates from {}", provider.name());
                    return Ok(snapshot);
                }
                Err(e) => {
                    warn!("rate provider {} unavailable: {}", provider.name(), e);
                }
            }
        }

        Err(ProviderError::Exhausted)
    }
}

pub struct TimeSeriesChain {
    providers: Vec<Box<dyn TimeSeriesProvider>>,
}

impl TimeSeriesChain {
    pub fn new(providers: Vec<Box<dyn TimeSeriesProvider>>) -> Self {
        Self { providers }
    }

    pub async fn acquire(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalPoint>, ProviderError> {
        for provider in &self.providers {
            match provider.fetch_time_series(start, end).await {
                Ok(points) => {
                    info!(
                        "fetched {} historical points from {}",
                        points.len(),
                        provider.name()
                    );
                    return Ok(points);
                }
                Err(e) => {
                    warn!("timeseries provider {} unavailable: {}", provider.name(), e);
                }
            }
        }

        Err(ProviderError::Exhausted)
    }
}
