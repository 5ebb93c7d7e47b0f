use crate::services::{ExchangeRatesCache, HistoricalCache, MetalsCache};

#[derive(Clone)]
pub struct AppState {
    pub metals: MetalsCache,
    pub exchange_rates: ExchangeRatesCache,
    pub historical: HistoricalCache,
    /// Shared secret the scheduled trigger must present as a bearer token.
    pub cron_secret: String,
}
