use crate::models::asset::AssetClass;

use super::coinbase::CoinbaseProvider;
use super::coincap::CoinCapProvider;
use super::coingecko::CoinGeckoProvider;
use super::traits::QuoteProvider;
use super::yahoo_finance::YahooFinanceProvider;

/// Registry of all available quote sources, in fallback order.
///
/// The adapter asks for every source supporting an asset class and
/// tries them in registration order — first success wins.
pub struct QuoteProviderRegistry {
    providers: Vec<Box<dyn QuoteProvider>>,
}

impl QuoteProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Registry with the default source chain:
    /// Yahoo Finance for equities; CoinGecko → Coinbase → CoinCap for
    /// crypto. None of these require an API key.
    pub fn new_with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(YahooFinanceProvider::new()));
        registry.register(Box::new(CoinGeckoProvider::new()));
        registry.register(Box::new(CoinbaseProvider::new()));
        registry.register(Box::new(CoinCapProvider::new()));
        registry
    }

    /// Register a source. Order of registration is fallback priority.
    pub fn register(&mut self, provider: Box<dyn QuoteProvider>) {
        self.providers.push(provider);
    }

    /// All sources supporting the given asset class, in priority order.
    pub fn providers_for(&self, asset_class: AssetClass) -> Vec<&dyn QuoteProvider> {
        self.providers
            .iter()
            .filter(|p| p.supported_asset_classes().contains(&asset_class))
            .map(|p| p.as_ref())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for QuoteProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
