pub(crate) mod cron;
pub(crate) mod exchange_rates;
pub(crate) mod health;
pub(crate) mod historical;
pub(crate) mod nisab;

/// Monetary amounts leave the API rounded to cents.
pub(crate) fn round_amount(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
