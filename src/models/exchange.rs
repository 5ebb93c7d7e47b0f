use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateSource {
    #[serde(rename = "exchangerate-api")]
    ExchangeRateApi,
    #[serde(rename = "fallback")]
    Fallback,
}

/// Currency-code -> multiplier-against-USD table, stored under
/// `exchange:rates`. Lookups for codes that are absent are the caller's
/// concern (treated as 1:1); the table itself always carries at least USD.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRatesSnapshot {
    pub rates: HashMap<String, f64>,
    pub last_updated: DateTime<Utc>,
    pub source: RateSource,
}

impl ExchangeRatesSnapshot {
    /// Minimal table used when no provider and no cached table is available.
    pub fn static_fallback() -> Self {
        let mut rates = HashMap::new();
        rates.insert("USD".to_string(), 1.0);
        Self {
            rates,
            last_updated: Utc::now(),
            source: RateSource::Fallback,
        }
    }
}
