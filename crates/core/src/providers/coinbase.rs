use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

use super::traits::QuoteProvider;
use crate::errors::CoreError;
use crate::models::asset::AssetClass;

const BASE_URL: &str = "https://api.coinbase.com/v2";

/// Coinbase spot-price endpoint for crypto quotes. First fallback after
/// CoinGecko.
///
/// Coinbase keys prices by uppercase currency pairs ("BTC-USD") and
/// returns the amount as a decimal string, which parses losslessly.
pub struct CoinbaseProvider {
    client: Client,
}

impl CoinbaseProvider {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for CoinbaseProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── Coinbase API response types ─────────────────────────────────────

#[derive(Deserialize)]
struct SpotResponse {
    data: SpotData,
}

#[derive(Deserialize)]
struct SpotData {
    amount: String,
}

#[async_trait]
impl QuoteProvider for CoinbaseProvider {
    fn name(&self) -> &str {
        "Coinbase"
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Crypto]
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Decimal, CoreError> {
        let pair = format!("{}-USD", symbol.to_uppercase());
        let url = format!("{BASE_URL}/prices/{pair}/spot");

        let resp: SpotResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "Coinbase".into(),
                message: format!("Failed to parse spot response for {pair}: {e}"),
            })?;

        resp.data.amount.parse().map_err(|e| CoreError::Api {
            provider: "Coinbase".into(),
            message: format!("Invalid price format for {pair}: {e}"),
        })
    }
}
