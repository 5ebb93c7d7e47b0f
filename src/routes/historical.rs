use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::routes::round_amount;
use crate::state::AppState;

const GOLD_NISAB_GRAMS: f64 = 87.48;
const SILVER_NISAB_GRAMS: f64 = 612.36;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_historical))
}

#[derive(Debug, Deserialize)]
pub struct HistoricalQuery {
    timeframe: Option<String>,
    currency: Option<String>,
    rate: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NisabPoint {
    date: String,
    gold_nisab: f64,
    silver_nisab: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalResponse {
    data: Vec<NisabPoint>,
    currency: String,
    last_updated: DateTime<Utc>,
}

/// GET /api/historical?timeframe=30d&currency=PKR&rate=278.5
///
/// Chart feed: the cached per-gram series converted into nisab values in
/// the requested currency. Unknown timeframes fall back to 7d.
pub async fn get_historical(
    Query(query): Query<HistoricalQuery>,
    State(state): State<AppState>,
) -> Json<HistoricalResponse> {
    let timeframe = query.timeframe.unwrap_or_else(|| "7d".to_string());
    let currency = query.currency.unwrap_or_else(|| "USD".to_string());
    let rate = if currency == "USD" {
        1.0
    } else {
        query.rate.unwrap_or(1.0)
    };

    info!("GET /api/historical - timeframe={timeframe} currency={currency}");

    let snapshot = state.historical.get().await;

    let series = if timeframe == "30d" {
        &snapshot.thirty_day
    } else {
        &snapshot.seven_day
    };

    let data = series
        .iter()
        .map(|point| NisabPoint {
            date: point.date.format("%b %-d").to_string(),
            gold_nisab: round_amount(point.gold_price * GOLD_NISAB_GRAMS * rate),
            silver_nisab: round_amount(point.silver_price * SILVER_NISAB_GRAMS * rate),
        })
        .collect();

    Json(HistoricalResponse {
        data,
        currency,
        last_updated: snapshot.last_updated,
    })
}
