use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::crypto_ids;
use super::traits::QuoteProvider;
use crate::errors::CoreError;
use crate::models::asset::AssetClass;

const BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// CoinGecko simple-price endpoint for crypto quotes. Primary crypto
/// source.
///
/// CoinGecko keys assets by lowercase ids ("bitcoin"); symbols are
/// resolved through the shared id table.
pub struct CoinGeckoProvider {
    client: Client,
}

impl CoinGeckoProvider {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }
}

impl Default for CoinGeckoProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ── CoinGecko API response types ────────────────────────────────────

#[derive(Deserialize)]
struct VsPrices {
    usd: Option<f64>,
}

#[async_trait]
impl QuoteProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Crypto]
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Decimal, CoreError> {
        let id = crypto_ids::coin_id(symbol);
        let url = format!("{BASE_URL}/simple/price?ids={id}&vs_currencies=usd");

        let resp: HashMap<String, VsPrices> = self
            .client
            .get(&url)
            .send()
            .await?
            .json()
            .await
            .map_err(|e| CoreError::Api {
                provider: "CoinGecko".into(),
                message: format!("Failed to parse price response for {symbol}: {e}"),
            })?;

        let price = resp
            .get(&id)
            .and_then(|p| p.usd)
            .ok_or_else(|| CoreError::Api {
                provider: "CoinGecko".into(),
                message: format!("No USD price for {symbol} (id {id})"),
            })?;

        Decimal::from_f64_retain(price).ok_or_else(|| CoreError::Api {
            provider: "CoinGecko".into(),
            message: format!("Unrepresentable price for {symbol}: {price}"),
        })
    }
}
