use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies which external source produced a metals snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    MetalPriceApi,
    GoldApi,
    IslamicApi,
    Fallback,
}

/// Current gold/silver prices in USD per gram, plus day-over-day change.
///
/// This is the record stored under `metals:current` and returned verbatim
/// to the API layer. Prices are rounded to 4 decimal places before storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetalsSnapshot {
    pub gold_price_per_gram: f64,
    pub silver_price_per_gram: f64,
    pub gold_price_change: f64,
    pub silver_price_change: f64,
    pub last_updated: DateTime<Utc>,
    pub source: PriceSource,
}

/// Prices from the last successful provider fetch, stored under
/// `metals:previous` solely to derive the change percentage on the next
/// successful fetch. Never written on cache hits or static fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviousPrices {
    pub gold: f64,
    pub silver: f64,
    pub date: DateTime<Utc>,
}
