use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::models::RateSource;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_exchange_rates))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRatesResponse {
    success: bool,
    rates: HashMap<String, f64>,
    last_updated: DateTime<Utc>,
    source: RateSource,
}

/// GET /api/exchange-rates
pub async fn get_exchange_rates(State(state): State<AppState>) -> Json<ExchangeRatesResponse> {
    info!("GET /api/exchange-rates");

    let snapshot = state.exchange_rates.get_rates().await;

    Json(ExchangeRatesResponse {
        success: true,
        rates: snapshot.rates,
        last_updated: snapshot.last_updated,
        source: snapshot.source,
    })
}
