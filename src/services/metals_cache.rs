use crate::external::fallback::SpotPriceChain;
use crate::external::provider::SpotQuote;
use crate::models::{MetalsSnapshot, PreviousPrices, PriceSource};
use crate::services::change::percent_change;
use crate::services::freshness::is_stale;
use crate::store::SharedCache;
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

const CURRENT_KEY: &str = "metals:current";
const PREVIOUS_KEY: &str = "metals:previous";

// Last-resort numbers, roughly $2650/oz gold and $30.5/oz silver.
const STATIC_GOLD_PER_GRAM: f64 = 85.17;
const STATIC_SILVER_PER_GRAM: f64 = 0.98;

/// Staleness-aware manager for the current gold/silver prices.
///
/// Reads serve the cached snapshot while it is under 24 hours old and
/// refresh synchronously otherwise. Concurrent refreshes of the same key
/// may race; the store's wholesale writes make that a duplicate fetch,
/// not a correctness problem.
#[derive(Clone)]
pub struct MetalsCache {
    cache: SharedCache,
    chain: Arc<SpotPriceChain>,
}

impl MetalsCache {
    pub fn new(cache: SharedCache, chain: Arc<SpotPriceChain>) -> Self {
        Self { cache, chain }
    }

    /// Read path used by the API layer.
    pub async fn get_current(&self) -> MetalsSnapshot {
        match self.cache.get::<MetalsSnapshot>(CURRENT_KEY).await {
            Some(cached) if !is_stale(cached.last_updated) => cached,
            Some(_) => {
                info!("metals cache is stale, refreshing");
                self.refresh().await
            }
            None => {
                info!("no metals cache entry, fetching fresh prices");
                self.refresh().await
            }
        }
    }

    /// Refresh path used by stale reads and the daily cron trigger.
    ///
    /// Never fails: when the whole provider chain is down this degrades to
    /// the cached snapshot regardless of age, and as a true last resort to
    /// the static numbers.
    pub async fn refresh(&self) -> MetalsSnapshot {
        match self.chain.acquire().await {
            Ok(quote) => self.store_quote(quote).await,
            Err(_) => {
                if let Some(cached) = self.cache.get::<MetalsSnapshot>(CURRENT_KEY).await {
                    warn!(
                        "all spot providers unavailable, serving cached prices from {}",
                        cached.last_updated
                    );
                    return cached;
                }

                error!("all spot providers unavailable and no cached prices, using static fallback");
                let fallback = Self::static_fallback();
                self.cache.set(CURRENT_KEY, &fallback).await;
                fallback
            }
        }
    }

    /// Persist a fresh quote and roll the previous-prices snapshot forward.
    /// Only successful provider fetches land here, so the change baseline
    /// is never polluted by fallback data.
    async fn store_quote(&self, quote: SpotQuote) -> MetalsSnapshot {
        let previous = self.cache.get::<PreviousPrices>(PREVIOUS_KEY).await;

        info!(
            "storing spot prices quoted at {} by {:?}",
            quote.as_of, quote.source
        );

        let snapshot = MetalsSnapshot {
            gold_price_per_gram: quote.gold_price_per_gram,
            silver_price_per_gram: quote.silver_price_per_gram,
            gold_price_change: percent_change(
                quote.gold_price_per_gram,
                previous.as_ref().map(|p| p.gold),
            ),
            silver_price_change: percent_change(
                quote.silver_price_per_gram,
                previous.as_ref().map(|p| p.silver),
            ),
            last_updated: Utc::now(),
            source: quote.source,
        };

        self.cache.set(CURRENT_KEY, &snapshot).await;
        self.cache
            .set(
                PREVIOUS_KEY,
                &PreviousPrices {
                    gold: snapshot.gold_price_per_gram,
                    silver: snapshot.silver_price_per_gram,
                    date: Utc::now(),
                },
            )
            .await;

        snapshot
    }

    fn static_fallback() -> MetalsSnapshot {
        MetalsSnapshot {
            gold_price_per_gram: STATIC_GOLD_PER_GRAM,
            silver_price_per_gram: STATIC_SILVER_PER_GRAM,
            gold_price_change: 0.0,
            silver_price_change: 0.0,
            last_updated: Utc::now(),
            source: PriceSource::Fallback,
        }
    }
}
