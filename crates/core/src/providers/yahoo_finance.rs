use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use super::traits::QuoteProvider;
use crate::errors::CoreError;
use crate::models::asset::AssetClass;

const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance chart endpoint for equity quotes.
///
/// - **Free**: no API key.
/// - **Endpoint**: `/v8/finance/chart/{symbol}?interval=1d&range=1d`,
///   current price in `chart.result[0].meta.regularMarketPrice`.
///
/// Symbols are case-sensitive on Yahoo's side and expected uppercase.
pub struct YahooFinanceProvider {
    client: Client,
}

impl YahooFinanceProvider {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for YahooFinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── Yahoo API response types ────────────────────────────────────────

#[derive(Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Deserialize)]
struct ChartBody {
    result: Option<Vec<ChartResult>>,
}

#[derive(Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Deserialize)]
struct ChartMeta {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[async_trait]
impl QuoteProvider for YahooFinanceProvider {
    fn name(&self) -> &str {
        "YahooFinance"
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Equity]
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Decimal, CoreError> {
        let ticker = symbol.to_uppercase();
        let url = format!("{BASE_URL}/{ticker}?interval=1d&range=1d");

        let resp: ChartResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "YahooFinance".into(),
                message: format!("Failed to parse chart response for {ticker}: {e}"),
            })?;

        let price = resp
            .chart
            .result
            .as_deref()
            .and_then(|r| r.first())
            .and_then(|r| r.meta.regular_market_price)
            .ok_or_else(|| CoreError::Api {
                provider: "YahooFinance".into(),
                message: format!("No market price in chart response for {ticker}"),
            })?;

        Decimal::from_f64_retain(price).ok_or_else(|| CoreError::Api {
            provider: "YahooFinance".into(),
            message: format!("Unrepresentable price for {ticker}: {price}"),
        })
    }
}
