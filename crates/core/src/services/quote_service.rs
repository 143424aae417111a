use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::errors::CoreError;
use crate::models::asset::AssetClass;
use crate::providers::registry::QuoteProviderRegistry;

/// Crypto quotes go stale quickly — 30 second cache.
pub const CRYPTO_CACHE_TTL: Duration = Duration::from_secs(30);
/// Equity quotes tolerate a 60 second cache.
pub const EQUITY_CACHE_TTL: Duration = Duration::from_secs(60);

struct CachedQuote {
    price: Decimal,
    fetched_at: Instant,
}

/// The quote-provider adapter: a short-lived cache in front of an
/// ordered chain of independent sources.
///
/// - A fresh cache hit short-circuits any network access.
/// - On a miss, sources are tried in registration order; the first
///   positive price wins (no averaging) and is cached.
/// - A source failing — network error, malformed payload, non-positive
///   value — is logged and skipped, never aborting the call.
/// - If every source fails the caller gets `QuoteUnavailable`, which
///   must not be treated as a zero price.
pub struct QuoteService {
    registry: QuoteProviderRegistry,
    cache: Mutex<HashMap<(AssetClass, String), CachedQuote>>,
}

impl QuoteService {
    pub fn new(registry: QuoteProviderRegistry) -> Self {
        Self {
            registry,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Cache-key normalization: uppercase for equities, lowercase for
    /// crypto, matching the identifier convention of each source family.
    pub fn normalize_symbol(symbol: &str, asset_class: AssetClass) -> String {
        match asset_class {
            AssetClass::Equity => symbol.trim().to_uppercase(),
            AssetClass::Crypto => symbol.trim().to_lowercase(),
        }
    }

    fn ttl_for(asset_class: AssetClass) -> Duration {
        match asset_class {
            AssetClass::Crypto => CRYPTO_CACHE_TTL,
            AssetClass::Equity => EQUITY_CACHE_TTL,
        }
    }

    /// Peek at the cache without touching the network. Returns the
    /// cached price only while it is still fresh.
    pub fn cached_price(&self, symbol: &str, asset_class: AssetClass) -> Option<Decimal> {
        let key = (asset_class, Self::normalize_symbol(symbol, asset_class));
        let cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache
            .get(&key)
            .filter(|q| q.fetched_at.elapsed() < Self::ttl_for(asset_class))
            .map(|q| q.price)
    }

    /// Get the current price for a symbol, from cache or the source
    /// chain. `QuoteUnavailable` when every source fails.
    pub async fn get_price(
        &self,
        symbol: &str,
        asset_class: AssetClass,
    ) -> Result<Decimal, CoreError> {
        if let Some(price) = self.cached_price(symbol, asset_class) {
            return Ok(price);
        }

        for provider in self.registry.providers_for(asset_class) {
            match provider.fetch_quote(symbol).await {
                Ok(price) if price > Decimal::ZERO => {
                    self.store_cached(symbol, asset_class, price);
                    return Ok(price);
                }
                Ok(price) => {
                    warn!(
                        "{} returned non-positive price {price} for {symbol}, trying next source",
                        provider.name()
                    );
                }
                Err(e) => {
                    debug!(
                        "{} failed for {symbol}: {e}, trying next source",
                        provider.name()
                    );
                }
            }
        }

        Err(CoreError::QuoteUnavailable {
            symbol: symbol.to_string(),
            asset_class: asset_class.to_string(),
        })
    }

    fn store_cached(&self, symbol: &str, asset_class: AssetClass, price: Decimal) {
        let key = (asset_class, Self::normalize_symbol(symbol, asset_class));
        let mut cache = self.cache.lock().unwrap_or_else(|e| e.into_inner());
        cache.insert(
            key,
            CachedQuote {
                price,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop all cached quotes (e.g. before a manual refresh that should
    /// hit the sources).
    pub fn clear_cache(&self) {
        self.cache
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
