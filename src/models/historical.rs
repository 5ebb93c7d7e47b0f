use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One calendar day of per-gram prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub gold_price: f64,
    pub silver_price: f64,
}

/// 7-day and 30-day price history, stored under `metals:historical`.
/// Both series are ascending by date with one point per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalSnapshot {
    pub seven_day: Vec<HistoricalPoint>,
    pub thirty_day: Vec<HistoricalPoint>,
    pub last_updated: DateTime<Utc>,
}

impl HistoricalSnapshot {
    pub fn empty() -> Self {
        Self {
            seven_day: Vec::new(),
            thirty_day: Vec::new(),
            last_updated: Utc::now(),
        }
    }
}
