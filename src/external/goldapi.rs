use crate::external::provider::{
    http_client, round_price, ProviderError, SpotPriceProvider, SpotQuote,
};
use crate::models::PriceSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// First spot fallback: goldapi.io.
///
/// One request per metal, authenticated with an `x-access-token` header.
/// Responses already quote 24k prices per gram, so no unit conversion.
pub struct GoldApiProvider {
    client: reqwest::Client,
    api_key: String,
}

impl GoldApiProvider {
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("GOLDAPI_IO_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("GOLDAPI_IO_API_KEY not set".into()))?;

        Ok(Self {
            client: http_client(),
            api_key,
        })
    }

    async fn fetch_metal(&self, symbol: &str) -> Result<GoldApiResponse, ProviderError> {
        let resp = self
            .client
            .get(format!("https://www.goldapi.io/api/{symbol}/USD"))
            .header("x-access-token", &self.api_key)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!(
                "goldapi {symbol} returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct GoldApiResponse {
    price_gram_24k: Option<f64>,
    timestamp: Option<i64>,
}

fn normalize(gold: GoldApiResponse, silver: GoldApiResponse) -> Result<SpotQuote, ProviderError> {
    let gold_price = gold
        .price_gram_24k
        .ok_or_else(|| ProviderError::BadResponse("missing gold price_gram_24k".into()))?;
    let silver_price = silver
        .price_gram_24k
        .ok_or_else(|| ProviderError::BadResponse("missing silver price_gram_24k".into()))?;

    if gold_price <= 0.0 || silver_price <= 0.0 {
        return Err(ProviderError::BadResponse(format!(
            "non-positive gram prices gold={gold_price} silver={silver_price}"
        )));
    }

    let as_of = gold
        .timestamp
        .or(silver.timestamp)
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    Ok(SpotQuote {
        gold_price_per_gram: round_price(gold_price),
        silver_price_per_gram: round_price(silver_price),
        as_of,
        source: PriceSource::GoldApi,
    })
}

#[async_trait]
impl SpotPriceProvider for GoldApiProvider {
    async fn fetch_spot_prices(&self) -> Result<SpotQuote, ProviderError> {
        let (gold, silver) = tokio::join!(self.fetch_metal("XAU"), self.fetch_metal("XAG"));
        normalize(gold?, silver?)
    }

    fn name(&self) -> &'static str {
        "goldapi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_gram_prices_directly() {
        let gold: GoldApiResponse = serde_json::from_value(json!({
            "price_gram_24k": 85.171849, "timestamp": 1735689600
        }))
        .unwrap();
        let silver: GoldApiResponse = serde_json::from_value(json!({
            "price_gram_24k": 0.98123, "timestamp": 1735689600
        }))
        .unwrap();

        let quote = normalize(gold, silver).unwrap();
        assert_eq!(quote.gold_price_per_gram, 85.1718);
        assert_eq!(quote.silver_price_per_gram, 0.9812);
        assert_eq!(quote.source, PriceSource::GoldApi);
    }

    #[test]
    fn missing_gram_price_is_unavailable() {
        let gold: GoldApiResponse = serde_json::from_value(json!({ "timestamp": 1 })).unwrap();
        let silver: GoldApiResponse =
            serde_json::from_value(json!({ "price_gram_24k": 0.98 })).unwrap();

        assert!(matches!(
            normalize(gold, silver),
            Err(ProviderError::BadResponse(_))
        ));
    }

    #[test]
    fn zero_price_is_unavailable() {
        let gold: GoldApiResponse =
            serde_json::from_value(json!({ "price_gram_24k": 0.0 })).unwrap();
        let silver: GoldApiResponse =
            serde_json::from_value(json!({ "price_gram_24k": 0.98 })).unwrap();

        assert!(normalize(gold, silver).is_err());
    }
}
