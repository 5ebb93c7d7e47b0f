use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{cron, exchange_rates, health, historical, nisab};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/nisab", nisab::router())
        .nest("/api/exchange-rates", exchange_rates::router())
        .nest("/api/historical", historical::router())
        .nest("/api/cron", cron::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
