use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::errors::CoreError;
use crate::models::asset::AssetClass;

/// Trait abstraction for external quote sources.
///
/// Each source (Yahoo Finance, CoinGecko, Coinbase, CoinCap) implements
/// this trait. The adapter iterates sources in registration order and
/// takes the first success, so a dead or reshaped API is a one-file fix.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Human-readable name of this source (for logs/errors).
    fn name(&self) -> &str;

    /// Which asset classes this source can quote.
    fn supported_asset_classes(&self) -> Vec<AssetClass>;

    /// Fetch the current price for a symbol, in USD.
    ///
    /// Implementations apply their own source-specific symbol casing;
    /// callers pass the raw uppercase ticker.
    async fn fetch_quote(&self, symbol: &str) -> Result<Decimal, CoreError>;
}
