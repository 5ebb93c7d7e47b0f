use crate::external::fallback::TimeSeriesChain;
use crate::models::HistoricalSnapshot;
use crate::services::freshness::is_stale;
use crate::store::SharedCache;
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

const HISTORICAL_KEY: &str = "metals:historical";

/// Staleness-aware manager for the 7-day/30-day price history.
///
/// Unlike the spot caches this one serves stale data immediately and
/// revalidates in the background: the chart tolerates day-old numbers and
/// the timeframe queries are the most expensive calls we make. A per-key
/// in-flight flag keeps a burst of stale reads from spawning a refresh
/// storm; concurrent refreshes across instances remain possible and are
/// resolved by last-writer-wins at the store.
#[derive(Clone)]
pub struct HistoricalCache {
    cache: SharedCache,
    chain: Arc<TimeSeriesChain>,
    refresh_in_flight: Arc<AtomicBool>,
}

impl HistoricalCache {
    pub fn new(cache: SharedCache, chain: Arc<TimeSeriesChain>) -> Self {
        Self {
            cache,
            chain,
            refresh_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn get(&self) -> HistoricalSnapshot {
        match self.cache.get::<HistoricalSnapshot>(HISTORICAL_KEY).await {
            Some(cached) if !is_stale(cached.last_updated) => cached,
            Some(stale) => {
                info!("historical cache is stale, serving it and revalidating in background");
                self.spawn_refresh();
                stale
            }
            None => {
                info!("no historical cache entry, fetching");
                self.refresh().await
            }
        }
    }

    fn spawn_refresh(&self) {
        if self
            .refresh_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let this = self.clone();
        tokio::spawn(async move {
            this.refresh().await;
            this.refresh_in_flight.store(false, Ordering::SeqCst);
        });
    }

    /// Fetch both windows and replace the cached snapshot wholesale.
    /// On provider failure the cached snapshot (any age) is served; with
    /// nothing cached the chart gets empty series rather than an error.
    pub async fn refresh(&self) -> HistoricalSnapshot {
        let today = Utc::now().date_naive();

        let seven_day = self
            .chain
            .acquire(today - Duration::days(7), today)
            .await;
        let thirty_day = self
            .chain
            .acquire(today - Duration::days(30), today)
            .await;

        match (seven_day, thirty_day) {
            (Ok(seven_day), Ok(thirty_day)) => {
                let snapshot = HistoricalSnapshot {
                    seven_day,
                    thirty_day,
                    last_updated: Utc::now(),
                };
                self.cache.set(HISTORICAL_KEY, &snapshot).await;
                snapshot
            }
            _ => {
                if let Some(cached) = self.cache.get::<HistoricalSnapshot>(HISTORICAL_KEY).await {
                    warn!(
                        "historical providers unavailable, keeping cached series from {}",
                        cached.last_updated
                    );
                    return cached;
                }

                warn!("historical providers unavailable and nothing cached, serving empty series");
                HistoricalSnapshot::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::provider::{ProviderError, TimeSeriesProvider};
    use crate::models::HistoricalPoint;
    use crate::store::{MemoryStore, SharedCache};
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration as StdDuration;

    struct CountingSeries {
        calls: Arc<AtomicUsize>,
        available: bool,
        delay: StdDuration,
    }

    #[async_trait]
    impl TimeSeriesProvider for CountingSeries {
        async fn fetch_time_series(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<Vec<HistoricalPoint>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            if !self.available {
                return Err(ProviderError::Network("stubbed outage".into()));
            }

            let mut points = Vec::new();
            let mut date = start;
            while date <= end {
                points.push(HistoricalPoint {
                    date,
                    gold_price: 85.0,
                    silver_price: 0.98,
                });
                date = date + Duration::days(1);
            }
            Ok(points)
        }

        fn name(&self) -> &'static str {
            "stub"
        }
    }

    fn service(
        available: bool,
        delay: StdDuration,
    ) -> (HistoricalCache, SharedCache, Arc<AtomicUsize>) {
        let cache = SharedCache::new(Arc::new(MemoryStore::new()));
        let calls = Arc::new(AtomicUsize::new(0));
        let chain = TimeSeriesChain::new(vec![Box::new(CountingSeries {
            calls: calls.clone(),
            available,
            delay,
        })]);
        (
            HistoricalCache::new(cache.clone(), Arc::new(chain)),
            cache,
            calls,
        )
    }

    fn stale_snapshot() -> HistoricalSnapshot {
        HistoricalSnapshot {
            seven_day: vec![HistoricalPoint {
                date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
                gold_price: 80.0,
                silver_price: 0.9,
            }],
            thirty_day: Vec::new(),
            last_updated: Utc::now() - Duration::hours(25),
        }
    }

    #[tokio::test]
    async fn empty_cache_refreshes_synchronously() {
        let (svc, cache, calls) = service(true, StdDuration::ZERO);

        let result = svc.get().await;

        // One acquire per window.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(result.seven_day.len(), 8);
        assert_eq!(result.thirty_day.len(), 31);
        assert!(cache
            .get::<HistoricalSnapshot>(HISTORICAL_KEY)
            .await
            .is_some());
    }

    #[tokio::test]
    async fn series_are_ascending_with_unique_dates() {
        let (svc, _cache, _calls) = service(true, StdDuration::ZERO);

        let result = svc.get().await;

        for pair in result.thirty_day.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
    }

    #[tokio::test]
    async fn stale_read_returns_immediately_and_revalidates_in_background() {
        let (svc, cache, calls) = service(true, StdDuration::ZERO);
        cache.set(HISTORICAL_KEY, &stale_snapshot()).await;

        let result = svc.get().await;

        // The caller sees the stale data, not the refresh result.
        assert_eq!(result.seven_day.len(), 1);
        assert_eq!(result.seven_day[0].gold_price, 80.0);

        // The detached refresh lands shortly after.
        for _ in 0..100 {
            tokio::time::sleep(StdDuration::from_millis(10)).await;
            let stored: HistoricalSnapshot = cache.get(HISTORICAL_KEY).await.unwrap();
            if !is_stale(stored.last_updated) {
                assert_eq!(calls.load(Ordering::SeqCst), 2);
                return;
            }
        }
        panic!("background refresh never updated the cache");
    }

    #[tokio::test]
    async fn concurrent_stale_reads_spawn_a_single_refresh() {
        let (svc, cache, calls) = service(true, StdDuration::from_millis(100));
        cache.set(HISTORICAL_KEY, &stale_snapshot()).await;

        let first = svc.get().await;
        let second = svc.get().await;

        assert_eq!(first.seven_day.len(), 1);
        assert_eq!(second.seven_day.len(), 1);

        // Wait out the slow stub; only the first read's refresh ran.
        tokio::time::sleep(StdDuration::from_millis(400)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn outage_with_empty_cache_serves_empty_series_without_persisting() {
        let (svc, cache, _calls) = service(false, StdDuration::ZERO);

        let result = svc.get().await;

        assert!(result.seven_day.is_empty());
        assert!(result.thirty_day.is_empty());
        // Nothing cached, so the next read tries again.
        assert!(cache
            .get::<HistoricalSnapshot>(HISTORICAL_KEY)
            .await
            .is_none());
    }
}
