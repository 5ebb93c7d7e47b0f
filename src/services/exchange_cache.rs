use crate::external::fallback::RateTableChain;
use crate::models::ExchangeRatesSnapshot;
use crate::services::freshness::is_stale;
use crate::store::SharedCache;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

const RATES_KEY: &str = "exchange:rates";

/// Staleness-aware manager for the currency conversion table.
/// Same synchronous refresh policy as the metals cache.
#[derive(Clone)]
pub struct ExchangeRatesCache {
    cache: SharedCache,
    chain: Arc<RateTableChain>,
}

impl ExchangeRatesCache {
    pub fn new(cache: SharedCache, chain: Arc<RateTableChain>) -> Self {
        Self { cache, chain }
    }

    pub async fn get_rates(&self) -> ExchangeRatesSnapshot {
        match self.cache.get::<ExchangeRatesSnapshot>(RATES_KEY).await {
            Some(cached) if !is_stale(cached.last_updated) => cached,
            Some(_) => {
                info!("exchange rates cache is stale, refreshing");
                self.refresh().await
            }
            None => {
                info!("no exchange rates cache entry, fetching");
                self.refresh().await
            }
        }
    }

    pub async fn refresh(&self) -> ExchangeRatesSnapshot {
        match self.chain.acquire().await {
            Ok(fetched) => {
                info!(
                    "storing exchange rates last updated {} by provider",
                    fetched.last_updated
                );
                // Freshness tracks our acquisition time, not the provider's
                // own publish cadence (free tiers republish daily).
                let snapshot = ExchangeRatesSnapshot {
                    last_updated: Utc::now(),
                    ..fetched
                };
                self.cache.set(RATES_KEY, &snapshot).await;
                snapshot
            }
            Err(_) => {
                if let Some(cached) = self.cache.get::<ExchangeRatesSnapshot>(RATES_KEY).await {
                    warn!(
                        "exchange rate provider unavailable, serving cached table from {}",
                        cached.last_updated
                    );
                    return cached;
                }

                error!("exchange rate provider unavailable and no cached table, using USD-only fallback");
                let fallback = ExchangeRatesSnapshot::static_fallback();
                self.cache.set(RATES_KEY, &fallback).await;
                fallback
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::provider::{ProviderError, RateTableProvider};
    use crate::models::RateSource;
    use crate::store::{MemoryStore, SharedCache};
    use async_trait::async_trait;
    use chrono::Duration;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRates {
        calls: Arc<AtomicUsize>,
        available: bool,
    }

    #[async_trait]
    impl RateTableProvider for CountingRates {
        async fn fetch_rate_table(&self) -> Result<ExchangeRatesSnapshot, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.available {
                return Err(ProviderError::Network("stubbed outage".into()));
            }

            let mut rates = HashMap::new();
            rates.insert("USD".to_string(), 1.0);
            rates.insert("EUR".to_string(), 0.96);
            Ok(ExchangeRatesSnapshot {
                rates,
                last_updated: Utc::now() - Duration::hours(12),
                source: RateSource::ExchangeRateApi,
            })
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    fn service(available: bool) -> (ExchangeRatesCache, SharedCache, Arc<AtomicUsize>) {
        let cache = SharedCache::new(Arc::new(MemoryStore::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = RateTableChain::new(vec![Box::new(CountingRates {
            calls: calls.clone(),
            available,
        })]);
        (
            ExchangeRatesCache::new(cache.clone(), Arc::new(chain)),
            cache,
            calls,
        )
    }

    fn cached_table(age_hours: i64) -> ExchangeRatesSnapshot {
        let mut rates = HashMap::new();
        rates.insert("USD".to_string(), 1.0);
        rates.insert("PKR".to_string(), 278.5);
        ExchangeRatesSnapshot {
            rates,
            last_updated: Utc::now() - Duration::hours(age_hours),
            source: RateSource::ExchangeRateApi,
        }
    }

    #[tokio::test]
    async fn twenty_five_hour_old_table_triggers_exactly_one_refresh() {
        let (svc, cache, calls) = service(true);
        cache.set(RATES_KEY, &cached_table(25)).await;

        let result = svc.get_rates().await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.rates.contains_key("EUR"));
        assert!(!is_stale(result.last_updated));
    }

    #[tokio::test]
    async fn fresh_table_is_served_without_provider_calls() {
        let (svc, cache, calls) = service(true);
        cache.set(RATES_KEY, &cached_table(12)).await;

        let result = svc.get_rates().await;

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(result.rates.contains_key("PKR"));
    }

    #[tokio::test]
    async fn outage_with_empty_cache_yields_usd_only_fallback() {
        let (svc, _cache, _calls) = service(false);

        let result = svc.get_rates().await;

        assert_eq!(result.source, RateSource::Fallback);
        assert_eq!(result.rates.get("USD"), Some(&1.0));
    }

    #[tokio::test]
    async fn outage_serves_cached_table_even_if_stale() {
        let (svc, cache, _calls) = service(false);
        cache.set(RATES_KEY, &cached_table(30)).await;

        let result = svc.get_rates().await;

        assert_eq!(result.source, RateSource::ExchangeRateApi);
        assert!(result.rates.contains_key("PKR"));
    }
}
