use crate::external::provider::{
    http_client, round_price, ProviderError, SpotPriceProvider, SpotQuote,
};
use crate::models::PriceSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Second spot fallback: islamicapi.com.
///
/// Serves Islamic-finance data rather than raw spot quotes; the nisab
/// threshold payload carries per-gram unit prices we can reuse.
pub struct IslamicApiProvider {
    client: reqwest::Client,
    api_key: String,
}

impl IslamicApiProvider {
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("ISLAMICAPI_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("ISLAMICAPI_API_KEY not set".into()))?;

        Ok(Self {
            client: http_client(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NisabResponse {
    code: Option<u16>,
    data: Option<NisabData>,
}

#[derive(Debug, Deserialize)]
struct NisabData {
    nisab_thresholds: Option<NisabThresholds>,
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct NisabThresholds {
    gold: Option<MetalThreshold>,
    silver: Option<MetalThreshold>,
}

#[derive(Debug, Deserialize)]
struct MetalThreshold {
    unit_price: Option<f64>,
}

fn normalize(body: NisabResponse) -> Result<SpotQuote, ProviderError> {
    if body.code != Some(200) {
        return Err(ProviderError::BadResponse(format!(
            "islamicapi returned code {:?}",
            body.code
        )));
    }

    let data = body
        .data
        .ok_or_else(|| ProviderError::BadResponse("missing data".into()))?;
    let thresholds = data
        .nisab_thresholds
        .ok_or_else(|| ProviderError::BadResponse("missing nisab_thresholds".into()))?;

    let gold = thresholds
        .gold
        .and_then(|t| t.unit_price)
        .ok_or_else(|| ProviderError::BadResponse("missing gold unit_price".into()))?;
    let silver = thresholds
        .silver
        .and_then(|t| t.unit_price)
        .ok_or_else(|| ProviderError::BadResponse("missing silver unit_price".into()))?;

    if gold <= 0.0 || silver <= 0.0 {
        return Err(ProviderError::BadResponse(format!(
            "non-positive unit prices gold={gold} silver={silver}"
        )));
    }

    Ok(SpotQuote {
        gold_price_per_gram: round_price(gold),
        silver_price_per_gram: round_price(silver),
        as_of: data.updated_at.unwrap_or_else(Utc::now),
        source: PriceSource::IslamicApi,
    })
}

#[async_trait]
impl SpotPriceProvider for IslamicApiProvider {
    async fn fetch_spot_prices(&self) -> Result<SpotQuote, ProviderError> {
        let resp = self
            .client
            .get("https://islamicapi.com/api/v1/zakat-nisab/")
            .query(&[
                ("standard", "classical"),
                ("currency", "usd"),
                ("unit", "g"),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!(
                "islamicapi returned {}",
                resp.status()
            )));
        }

        let body: NisabResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        normalize(body)
    }

    fn name(&self) -> &'static str {
        "islamicapi"
    }
}
