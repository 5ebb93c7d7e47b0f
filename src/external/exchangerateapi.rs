use crate::external::provider::{http_client, ProviderError, RateTableProvider};
use crate::models::{ExchangeRatesSnapshot, RateSource};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// Exchange-rate provider: v6.exchangerate-api.com, full table against USD.
pub struct ExchangeRateApiProvider {
    client: reqwest::Client,
    api_key: String,
}

impl ExchangeRateApiProvider {
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("EXCHANGE_RATE_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("EXCHANGE_RATE_API_KEY not set".into()))?;

        Ok(Self {
            client: http_client(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    result: Option<String>,
    time_last_update_unix: Option<i64>,
    conversion_rates: Option<HashMap<String, f64>>,
}

fn normalize(body: LatestRatesResponse) -> Result<ExchangeRatesSnapshot, ProviderError> {
    if body.result.as_deref() != Some("success") {
        return Err(ProviderError::BadResponse(format!(
            "exchangerate-api result {:?}",
            body.result
        )));
    }

    let rates = body
        .conversion_rates
        .ok_or_else(|| ProviderError::BadResponse("missing conversion_rates".into()))?;

    if rates.is_empty() {
        return Err(ProviderError::BadResponse("empty conversion_rates".into()));
    }

    let last_updated = body
        .time_last_update_unix
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    Ok(ExchangeRatesSnapshot {
        rates,
        last_updated,
        source: RateSource::ExchangeRateApi,
    })
}

#[async_trait]
impl RateTableProvider for ExchangeRateApiProvider {
    async fn fetch_rate_table(&self) -> Result<ExchangeRatesSnapshot, ProviderError> {
        let resp = self
            .client
            .get(format!(
                "https://v6.exchangerate-api.com/v6/{}/latest/USD",
                self.api_key
            ))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!(
                "exchangerate-api returned {}",
                resp.status()
            )));
        }

        let body: LatestRatesResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        normalize(body)
    }

    fn name(&self) -> &'static str {
        "exchangerate-api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_conversion_table() {
        let body: LatestRatesResponse = serde_json::from_value(json!({
            "result": "success",
            "time_last_update_unix": 1735689600,
            "conversion_rates": { "USD": 1.0, "EUR": 0.96, "PKR": 278.5 }
        }))
        .unwrap();

        let snapshot = normalize(body).unwrap();
        assert_eq!(snapshot.rates.len(), 3);
        assert_eq!(snapshot.rates["USD"], 1.0);
        assert_eq!(snapshot.source, RateSource::ExchangeRateApi);
    }

    #[test]
    fn missing_rates_field_is_unavailable() {
        let body: LatestRatesResponse =
            serde_json::from_value(json!({ "result": "success" })).unwrap();

        assert!(matches!(
            normalize(body),
            Err(ProviderError::BadResponse(_))
        ));
    }

    #[test]
    fn error_result_is_unavailable() {
        let body: LatestRatesResponse = serde_json::from_value(json!({
            "result": "error",
            "conversion_rates": { "USD": 1.0 }
        }))
        .unwrap();

        assert!(normalize(body).is_err());
    }
}
