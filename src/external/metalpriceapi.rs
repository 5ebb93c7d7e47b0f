use crate::external::provider::{
    http_client, round_price, ProviderError, SpotPriceProvider, SpotQuote, TimeSeriesProvider,
    TROY_OUNCE_TO_GRAMS,
};
use crate::models::{HistoricalPoint, PriceSource};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Primary provider: metalpriceapi.com.
///
/// The free tier quotes XAU/XAG as inverse rates against USD (troy ounces
/// per dollar), so the per-gram price is `1 / rate / grams-per-ounce`.
/// Also the only source used for the historical timeframe query.
pub struct MetalPriceApiProvider {
    client: reqwest::Client,
    api_key: String,
}

impl MetalPriceApiProvider {
    pub fn from_env() -> Result<Self, ProviderError> {
        let api_key = std::env::var("METALPRICEAPI_API_KEY")
            .map_err(|_| ProviderError::MissingConfig("METALPRICEAPI_API_KEY not set".into()))?;

        Ok(Self {
            client: http_client(),
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    success: Option<bool>,
    timestamp: Option<i64>,
    rates: Option<LatestRates>,
}

#[derive(Debug, Deserialize)]
struct LatestRates {
    #[serde(rename = "XAU")]
    xau: Option<f64>,
    #[serde(rename = "XAG")]
    xag: Option<f64>,
}

// Timeframe responses are keyed by "YYYY-MM-DD"; BTreeMap keeps them in
// ascending date order and collapses duplicates.
#[derive(Debug, Deserialize)]
struct TimeframeResponse {
    success: Option<bool>,
    rates: Option<BTreeMap<String, TimeframeRates>>,
}

#[derive(Debug, Deserialize)]
struct TimeframeRates {
    #[serde(rename = "XAU")]
    xau: Option<f64>,
    #[serde(rename = "XAG")]
    xag: Option<f64>,
}

fn normalize_latest(body: LatestResponse) -> Result<SpotQuote, ProviderError> {
    if body.success != Some(true) {
        return Err(ProviderError::BadResponse(
            "metalpriceapi success flag not set".into(),
        ));
    }

    let rates = body
        .rates
        .ok_or_else(|| ProviderError::BadResponse("missing rates".into()))?;
    let xau = rates
        .xau
        .ok_or_else(|| ProviderError::BadResponse("missing XAU rate".into()))?;
    let xag = rates
        .xag
        .ok_or_else(|| ProviderError::BadResponse("missing XAG rate".into()))?;

    if xau <= 0.0 || xag <= 0.0 || !xau.is_finite() || !xag.is_finite() {
        return Err(ProviderError::BadResponse(format!(
            "non-positive rates XAU={xau} XAG={xag}"
        )));
    }

    let as_of = body
        .timestamp
        .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
        .unwrap_or_else(Utc::now);

    Ok(SpotQuote {
        gold_price_per_gram: round_price(1.0 / xau / TROY_OUNCE_TO_GRAMS),
        silver_price_per_gram: round_price(1.0 / xag / TROY_OUNCE_TO_GRAMS),
        as_of,
        source: PriceSource::MetalPriceApi,
    })
}

fn merge_timeframes(
    gold: TimeframeResponse,
    silver: TimeframeResponse,
) -> Result<Vec<HistoricalPoint>, ProviderError> {
    if gold.success != Some(true) || silver.success != Some(true) {
        return Err(ProviderError::BadResponse(
            "timeframe success flag not set".into(),
        ));
    }

    let gold_rates = gold
        .rates
        .ok_or_else(|| ProviderError::BadResponse("missing gold timeframe rates".into()))?;
    let silver_rates = silver
        .rates
        .ok_or_else(|| ProviderError::BadResponse("missing silver timeframe rates".into()))?;

    let mut points = Vec::with_capacity(gold_rates.len());

    for (date_str, day) in gold_rates {
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        // A day present for gold but not silver yields no usable point.
        let (Some(xau), Some(xag)) = (day.xau, silver_rates.get(&date_str).and_then(|d| d.xag))
        else {
            continue;
        };

        if xau <= 0.0 || xag <= 0.0 {
            continue;
        }

        points.push(HistoricalPoint {
            date,
            gold_price: round_price(1.0 / xau / TROY_OUNCE_TO_GRAMS),
            silver_price: round_price(1.0 / xag / TROY_OUNCE_TO_GRAMS),
        });
    }

    Ok(points)
}

#[async_trait]
impl SpotPriceProvider for MetalPriceApiProvider {
    async fn fetch_spot_prices(&self) -> Result<SpotQuote, ProviderError> {
        let resp = self
            .client
            .get("https://api.metalpriceapi.com/v1/latest")
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("base", "USD"),
                ("currencies", "XAU,XAG"),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!(
                "metalpriceapi returned {}",
                resp.status()
            )));
        }

        let body: LatestResponse = resp
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        normalize_latest(body)
    }

    fn name(&self) -> &'static str {
        "metalpriceapi"
    }
}

impl MetalPriceApiProvider {
    async fn fetch_timeframe(
        &self,
        currency: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TimeframeResponse, ProviderError> {
        let start_date = start.format("%Y-%m-%d").to_string();
        let end_date = end.format("%Y-%m-%d").to_string();

        let resp = self
            .client
            .get("https://api.metalpriceapi.com/v1/timeframe")
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("start_date", start_date.as_str()),
                ("end_date", end_date.as_str()),
                ("base", "USD"),
                ("currencies", currency),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(ProviderError::BadResponse(format!(
                "metalpriceapi timeframe returned {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))
    }
}

#[async_trait]
impl TimeSeriesProvider for MetalPriceApiProvider {
    async fn fetch_time_series(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HistoricalPoint>, ProviderError> {
        // The free plan only allows one symbol per timeframe call, so gold
        // and silver go out in parallel and get merged by date.
        let (gold, silver) = tokio::join!(
            self.fetch_timeframe("XAU", start, end),
            self.fetch_timeframe("XAG", start, end),
        );

        merge_timeframes(gold?, silver?)
    }

    fn name(&self) -> &'static str {
        "metalpriceapi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_inverse_ounce_rates_to_grams() {
        let body: LatestResponse = serde_json::from_value(json!({
            "success": true,
            "timestamp": 1735689600,
            "rates": { "XAU": 0.000377358, "XAG": 0.032786885 }
        }))
        .unwrap();

        let quote = normalize_latest(body).unwrap();

        // 1/0.000377358 = $2650/oz -> ~85.2/g
        assert!((quote.gold_price_per_gram - 85.2).abs() < 0.2);
        assert!((quote.silver_price_per_gram - 0.98).abs() < 0.02);
        assert!(quote.gold_price_per_gram > 0.0);
        assert!(quote.silver_price_per_gram > 0.0);
        assert_eq!(quote.source, PriceSource::MetalPriceApi);
    }

    #[test]
    fn missing_success_flag_is_unavailable() {
        let body: LatestResponse = serde_json::from_value(json!({
            "rates": { "XAU": 0.0004, "XAG": 0.03 }
        }))
        .unwrap();

        assert!(matches!(
            normalize_latest(body),
            Err(ProviderError::BadResponse(_))
        ));
    }

    #[test]
    fn missing_rates_is_unavailable() {
        let body: LatestResponse =
            serde_json::from_value(json!({ "success": true })).unwrap();

        assert!(matches!(
            normalize_latest(body),
            Err(ProviderError::BadResponse(_))
        ));
    }

    #[test]
    fn negative_rate_is_unavailable() {
        let body: LatestResponse = serde_json::from_value(json!({
            "success": true,
            "rates": { "XAU": -0.0004, "XAG": 0.03 }
        }))
        .unwrap();

        assert!(normalize_latest(body).is_err());
    }

    #[test]
    fn timeframe_merge_is_ascending_with_one_point_per_day() {
        let gold: TimeframeResponse = serde_json::from_value(json!({
            "success": true,
            "rates": {
                "2025-01-03": { "XAU": 0.000377 },
                "2025-01-01": { "XAU": 0.000378 },
                "2025-01-02": { "XAU": 0.000376 }
            }
        }))
        .unwrap();
        let silver: TimeframeResponse = serde_json::from_value(json!({
            "success": true,
            "rates": {
                "2025-01-01": { "XAG": 0.0328 },
                "2025-01-02": { "XAG": 0.0327 },
                "2025-01-03": { "XAG": 0.0326 }
            }
        }))
        .unwrap();

        let points = merge_timeframes(gold, silver).unwrap();

        assert_eq!(points.len(), 3);
        for pair in points.windows(2) {
            assert!(pair[0].date < pair[1].date);
        }
        assert!(points.iter().all(|p| p.gold_price > 0.0 && p.silver_price > 0.0));
    }

    #[test]
    fn timeframe_skips_days_missing_one_metal() {
        let gold: TimeframeResponse = serde_json::from_value(json!({
            "success": true,
            "rates": {
                "2025-01-01": { "XAU": 0.000378 },
                "2025-01-02": { "XAU": 0.000376 }
            }
        }))
        .unwrap();
        let silver: TimeframeResponse = serde_json::from_value(json!({
            "success": true,
            "rates": { "2025-01-01": { "XAG": 0.0328 } }
        }))
        .unwrap();

        let points = merge_timeframes(gold, silver).unwrap();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    }
}
