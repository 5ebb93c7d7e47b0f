use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::routes::round_amount;
use crate::state::AppState;

// Classical nisab masses. Dowry is mahr al-Fatimah (500 dirhams at
// 2.975 g silver each); diyyah approximates 1000 gold dinars.
const GOLD_NISAB_GRAMS: f64 = 87.48;
const SILVER_NISAB_GRAMS: f64 = 612.36;
const MAHR_AL_FATIMAH_GRAMS: f64 = 1487.5;
const DIYYAH_GOLD_GRAMS: f64 = 4374.0;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_nisab))
}

#[derive(Debug, Deserialize)]
pub struct NisabQuery {
    currency: Option<String>,
    rate: Option<f64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NisabValues {
    nisab_gold: f64,
    nisab_silver: f64,
    dowry: f64,
    diyyah: f64,
    currency: String,
    last_updated: DateTime<Utc>,
    gold_price_change: f64,
    silver_price_change: f64,
    gold_price_per_gram: f64,
    silver_price_per_gram: f64,
}

/// GET /api/nisab?currency=PKR&rate=278.5
///
/// Thresholds derive from the cached per-gram prices; the client supplies
/// the conversion rate it already fetched from /api/exchange-rates.
pub async fn get_nisab(
    Query(query): Query<NisabQuery>,
    State(state): State<AppState>,
) -> Json<NisabValues> {
    let currency = query.currency.unwrap_or_else(|| "USD".to_string());
    let currency_is_usd = currency == "USD";
    let rate = if currency_is_usd {
        1.0
    } else {
        query.rate.unwrap_or(1.0)
    };

    info!("GET /api/nisab - currency={currency}");

    let snapshot = state.metals.get_current().await;

    Json(NisabValues {
        nisab_gold: round_amount(snapshot.gold_price_per_gram * GOLD_NISAB_GRAMS * rate),
        nisab_silver: round_amount(snapshot.silver_price_per_gram * SILVER_NISAB_GRAMS * rate),
        dowry: round_amount(snapshot.silver_price_per_gram * MAHR_AL_FATIMAH_GRAMS * rate),
        diyyah: round_amount(snapshot.gold_price_per_gram * DIYYAH_GOLD_GRAMS * rate),
        currency,
        last_updated: snapshot.last_updated,
        gold_price_change: snapshot.gold_price_change,
        silver_price_change: snapshot.silver_price_change,
        // Per-gram USD prices keep their stored 4-place precision;
        // converted prices round to cents like the other amounts.
        gold_price_per_gram: if currency_is_usd {
            snapshot.gold_price_per_gram
        } else {
            round_amount(snapshot.gold_price_per_gram * rate)
        },
        silver_price_per_gram: if currency_is_usd {
            snapshot.silver_price_per_gram
        } else {
            round_amount(snapshot.silver_price_per_gram * rate)
        },
    })
}
