use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use super::crypto_ids;
use super::traits::QuoteProvider;
use crate::errors::CoreError;
use crate::models::asset::AssetClass;

const BASE_URL: &str = "https://api.coincap.io/v2";

/// CoinCap assets endpoint for crypto quotes. Last fallback in the
/// crypto chain.
///
/// CoinCap keys assets by lowercase ids like CoinGecko and returns the
/// USD price as a decimal string.
pub struct CoinCapProvider {
    client: Client,
}

impl CoinCapProvider {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for CoinCapProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── CoinCap API response types ──────────────────────────────────────

#[derive(Deserialize)]
struct AssetResponse {
    data: AssetData,
}

#[derive(Deserialize)]
struct AssetData {
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
}

#[async_trait]
impl QuoteProvider for CoinCapProvider {
    fn name(&self) -> &str {
        "CoinCap"
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Crypto]
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Decimal, CoreError> {
        let id = crypto_ids::coin_id(symbol);
        let url = format!("{BASE_URL}/assets/{id}");

        let resp: AssetResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "CoinCap".into(),
                message: format!("Failed to parse response for {symbol}: {e}"),
            })?;

        resp.data
            .price_usd
            .ok_or_else(|| CoreError::Api {
                provider: "CoinCap".into(),
                message: format!("No price data for {symbol} (id {id})"),
            })?
            .parse()
            .map_err(|e| CoreError::Api {
                provider: "CoinCap".into(),
                message: format!("Invalid price format for {symbol}: {e}"),
            })
    }
}
