pub mod change;
pub mod exchange_cache;
pub mod freshness;
pub mod historical_cache;
pub mod metals_cache;

pub use exchange_cache::ExchangeRatesCache;
pub use historical_cache::HistoricalCache;
pub use metals_cache::MetalsCache;
