use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{ExchangeRatesSnapshot, HistoricalSnapshot, MetalsSnapshot, PriceSource, RateSource};
use crate::services::freshness::is_stale;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/daily-update", get(daily_update))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUpdateResults {
    metal_prices: MetalsSnapshot,
    historical_data: HistoricalSnapshot,
    exchange_rates: ExchangeRatesSnapshot,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyUpdateResponse {
    success: bool,
    timestamp: DateTime<Utc>,
    results: DailyUpdateResults,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

/// GET /api/cron/daily-update
///
/// Entry point for the external daily scheduler. Guarded by a shared
/// secret so the refresh (and its provider quota) cannot be triggered by
/// the public. Each section refreshes independently; a degraded section
/// is reported but never fails the run.
pub async fn daily_update(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<DailyUpdateResponse>, AppError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if authorization != Some(format!("Bearer {}", state.cron_secret).as_str()) {
        warn!("GET /api/cron/daily-update - rejected unauthenticated trigger");
        return Err(AppError::Unauthorized);
    }

    info!("GET /api/cron/daily-update - Running daily refresh");

    let metal_prices = state.metals.refresh().await;
    let historical_data = state.historical.refresh().await;
    let exchange_rates = state.exchange_rates.refresh().await;

    let mut errors = Vec::new();
    if metal_prices.source == PriceSource::Fallback || is_stale(metal_prices.last_updated) {
        errors.push("metal prices".to_string());
    }
    if historical_data.seven_day.is_empty() || is_stale(historical_data.last_updated) {
        errors.push("historical data".to_string());
    }
    if exchange_rates.source == RateSource::Fallback || is_stale(exchange_rates.last_updated) {
        errors.push("exchange rates".to_string());
    }

    Ok(Json(DailyUpdateResponse {
        success: errors.is_empty(),
        timestamp: Utc::now(),
        results: DailyUpdateResults {
            metal_prices,
            historical_data,
            exchange_rates,
        },
        errors,
    }))
}
