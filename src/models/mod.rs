mod exchange;
mod historical;
mod metals;

pub use exchange::{ExchangeRatesSnapshot, RateSource};
pub use historical::{HistoricalPoint, HistoricalSnapshot};
pub use metals::{MetalsSnapshot, PreviousPrices, PriceSource};
