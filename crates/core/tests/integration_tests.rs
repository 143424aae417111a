// ═══════════════════════════════════════════════════════════════════
// Integration Tests — NetWorthTracker facade: sessions, asset CRUD,
// refresh cycles, persistence, backup
// ═══════════════════════════════════════════════════════════════════

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use networth_core::errors::CoreError;
use networth_core::models::asset::{AssetClass, Category};
use networth_core::models::chart::Timeframe;
use networth_core::providers::registry::QuoteProviderRegistry;
use networth_core::providers::traits::QuoteProvider;
use networth_core::services::refresh_service::RefreshScope;
use networth_core::storage::store::{KeyValueStore, MemoryStore};
use networth_core::{NetWorthTracker, TrackerConfig};

// ═══════════════════════════════════════════════════════════════════
// Mock source & counting store
// ═══════════════════════════════════════════════════════════════════

/// Serves a scripted symbol → price table for both asset classes.
struct ScriptedProvider {
    prices: Arc<Mutex<HashMap<String, Decimal>>>,
}

#[async_trait]
impl QuoteProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "ScriptedProvider"
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Equity, AssetClass::Crypto]
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Decimal, CoreError> {
        let prices = self.prices.lock().unwrap();
        prices
            .get(&symbol.to_uppercase())
            .copied()
            .ok_or_else(|| CoreError::Api {
                provider: "ScriptedProvider".into(),
                message: format!("no scripted price for {symbol}"),
            })
    }
}

fn tracker_with_prices(
    store: Arc<dyn KeyValueStore>,
    prices: &[(&str, Decimal)],
) -> NetWorthTracker {
    let table: HashMap<String, Decimal> = prices
        .iter()
        .map(|(s, p)| (s.to_string(), *p))
        .collect();
    let mut registry = QuoteProviderRegistry::new();
    registry.register(Box::new(ScriptedProvider {
        prices: Arc::new(Mutex::new(table)),
    }));
    NetWorthTracker::with_registry(store, registry, TrackerConfig::default())
}

/// Delegates to a MemoryStore while counting portfolio record writes.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    portfolio_writes: AtomicUsize,
}

impl KeyValueStore for CountingStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CoreError> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<(), CoreError> {
        if key.starts_with("portfolio:") {
            self.portfolio_writes.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), CoreError> {
        self.inner.remove(key)
    }
}

// ═══════════════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════════════

#[test]
fn sign_up_sign_out_sign_in_lifecycle() {
    let store = Arc::new(MemoryStore::new());
    let tracker = tracker_with_prices(store, &[]);

    assert!(tracker.active_user().is_none());
    tracker.sign_up("Alice@Example.com", "hunter2").unwrap();
    assert_eq!(tracker.active_user().as_deref(), Some("alice@example.com"));

    tracker
        .add_static_asset(Category::Savings, "Emergency fund", dec!(5000))
        .unwrap();
    assert_eq!(tracker.portfolio_total(), dec!(5000));

    tracker.sign_out().unwrap();
    assert!(tracker.active_user().is_none());
    assert_eq!(tracker.portfolio_total(), dec!(0));

    // Normalized key and correct secret restore the portfolio.
    tracker.sign_in("  ALICE@example.COM ", "hunter2").unwrap();
    assert_eq!(tracker.portfolio_total(), dec!(5000));
}

#[test]
fn credentials_are_validated() {
    let tracker = tracker_with_prices(Arc::new(MemoryStore::new()), &[]);
    tracker.sign_up("alice", "secret").unwrap();

    assert!(matches!(
        tracker.sign_up("ALICE", "other"),
        Err(CoreError::AlreadyExists(_))
    ));
    assert!(matches!(
        tracker.sign_in("alice", "wrong"),
        Err(CoreError::InvalidCredentials)
    ));
    assert!(matches!(
        tracker.sign_in("nobody", "secret"),
        Err(CoreError::InvalidCredentials)
    ));
    assert!(matches!(
        tracker.sign_up("", "secret"),
        Err(CoreError::InvalidCredentials)
    ));
}

#[test]
fn users_portfolios_are_isolated() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
    let tracker = tracker_with_prices(store, &[]);

    tracker.sign_up("alice", "a").unwrap();
    tracker
        .add_static_asset(Category::Checking, "Alice checking", dec!(100))
        .unwrap();

    tracker.sign_up("bob", "b").unwrap();
    assert_eq!(tracker.asset_count(), 0);
    tracker
        .add_static_asset(Category::Checking, "Bob checking", dec!(900))
        .unwrap();
    assert_eq!(tracker.portfolio_total(), dec!(900));

    tracker.sign_in("alice", "a").unwrap();
    assert_eq!(tracker.portfolio_total(), dec!(100));
    assert_eq!(tracker.assets_in(Category::Checking)[0].name, "Alice checking");
}

#[test]
fn anonymous_sessions_are_never_persisted() {
    let store = Arc::new(MemoryStore::new());
    let tracker = tracker_with_prices(store.clone(), &[]);

    tracker
        .add_static_asset(Category::Other, "Transient", dec!(42))
        .unwrap();
    assert_eq!(tracker.portfolio_total(), dec!(42));
    assert!(store.is_empty());
}

#[test]
fn active_session_is_restored_on_startup() {
    let store = Arc::new(MemoryStore::new());
    {
        let tracker = tracker_with_prices(store.clone(), &[]);
        tracker.sign_up("alice", "a").unwrap();
        tracker
            .add_static_asset(Category::Vehicles, "Car", dec!(18000))
            .unwrap();
    }

    let restored = tracker_with_prices(store, &[]);
    assert_eq!(restored.active_user().as_deref(), Some("alice"));
    assert_eq!(restored.portfolio_total(), dec!(18000));
}

// ═══════════════════════════════════════════════════════════════════
// Asset CRUD
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn ticker_asset_gets_its_creation_price_from_the_chain() {
    let tracker = tracker_with_prices(
        Arc::new(MemoryStore::new()),
        &[("BTC", dec!(43500)), ("AAPL", dec!(185))],
    );
    tracker.sign_up("alice", "a").unwrap();

    let id = tracker
        .add_ticker_asset(Category::Crypto, "Bitcoin", "btc", dec!(0.5))
        .await
        .unwrap()
        .expect("session unchanged");
    assert_eq!(tracker.portfolio_total(), dec!(21750.0));

    let assets = tracker.assets_in(Category::Crypto);
    assert_eq!(assets[0].id, id);
    assert_eq!(assets[0].ticker(), Some("BTC"));
}

#[tokio::test]
async fn ticker_assets_are_limited_to_eligible_categories() {
    let tracker = tracker_with_prices(Arc::new(MemoryStore::new()), &[("AAPL", dec!(185))]);
    let err = tracker
        .add_ticker_asset(Category::Checking, "Nope", "AAPL", dec!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidAssetInput(_)));
    assert_eq!(tracker.asset_count(), 0);
}

#[tokio::test]
async fn unresolvable_ticker_surfaces_quote_unavailable() {
    let tracker = tracker_with_prices(Arc::new(MemoryStore::new()), &[]);
    let err = tracker
        .add_ticker_asset(Category::Stocks, "Mystery", "ZZZZ", dec!(1))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::QuoteUnavailable { .. }));
    assert_eq!(tracker.asset_count(), 0);
}

#[test]
fn delete_asset_reports_whether_anything_was_removed() {
    let tracker = tracker_with_prices(Arc::new(MemoryStore::new()), &[]);
    tracker.sign_up("alice", "a").unwrap();
    let id = tracker
        .add_static_asset(Category::Other, "Collectible", dec!(750))
        .unwrap();

    assert!(tracker.delete_asset(Category::Other, id).unwrap());
    assert!(!tracker.delete_asset(Category::Other, id).unwrap());
    assert_eq!(tracker.asset_count(), 0);
}

// ═══════════════════════════════════════════════════════════════════
// Refresh cycles
// ═══════════════════════════════════════════════════════════════════

#[tokio::test]
async fn refresh_applies_new_prices_and_persists_once() {
    let store = Arc::new(CountingStore::default());

    // Session one: create the holdings at their original prices.
    {
        let tracker = tracker_with_prices(
            store.clone(),
            &[("BTC", dec!(40000)), ("AAPL", dec!(180))],
        );
        tracker.sign_up("alice", "a").unwrap();
        tracker
            .add_ticker_asset(Category::Crypto, "Bitcoin", "BTC", dec!(1))
            .await
            .unwrap();
        tracker
            .add_ticker_asset(Category::Stocks, "Apple", "AAPL", dec!(10))
            .await
            .unwrap();
        assert_eq!(tracker.portfolio_total(), dec!(41800));
    }

    // Session two: the market moved.
    let tracker = tracker_with_prices(
        store.clone(),
        &[("BTC", dec!(42000)), ("AAPL", dec!(190))],
    );
    assert_eq!(tracker.portfolio_total(), dec!(41800));

    let writes_before = store.portfolio_writes.load(Ordering::SeqCst);
    let outcome = tracker.refresh(RefreshScope::Full).await.unwrap();
    assert!(!outcome.skipped);
    assert_eq!(outcome.attempted, 2);
    assert_eq!(outcome.updated, 2);
    assert_eq!(outcome.failed, 0);
    assert_eq!(tracker.portfolio_total(), dec!(43900));

    // One persistence write for the whole batch.
    let writes_after = store.portfolio_writes.load(Ordering::SeqCst);
    assert_eq!(writes_after - writes_before, 1);

    // The new prices survive a restart.
    let restored = tracker_with_prices(store, &[]);
    assert_eq!(restored.portfolio_total(), dec!(43900));
    assert!(restored.snapshot().last_sync.is_some());
}

#[tokio::test]
async fn crypto_scope_leaves_equities_alone() {
    let store = Arc::new(MemoryStore::new());
    {
        let tracker = tracker_with_prices(
            store.clone(),
            &[("BTC", dec!(40000)), ("AAPL", dec!(180))],
        );
        tracker.sign_up("alice", "a").unwrap();
        tracker
            .add_ticker_asset(Category::Crypto, "Bitcoin", "BTC", dec!(1))
            .await
            .unwrap();
        tracker
            .add_ticker_asset(Category::Stocks, "Apple", "AAPL", dec!(10))
            .await
            .unwrap();
    }

    let tracker = tracker_with_prices(store, &[("BTC", dec!(50000)), ("AAPL", dec!(500))]);
    let outcome = tracker.refresh(RefreshScope::CryptoOnly).await.unwrap();
    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.updated, 1);
    // BTC moved to 50000, AAPL still 180 × 10.
    assert_eq!(tracker.portfolio_total(), dec!(51800));
}

#[tokio::test]
async fn failed_quotes_leave_holdings_untouched() {
    let store = Arc::new(MemoryStore::new());
    {
        let tracker = tracker_with_prices(store.clone(), &[("BTC", dec!(40000))]);
        tracker.sign_up("alice", "a").unwrap();
        tracker
            .add_ticker_asset(Category::Crypto, "Bitcoin", "BTC", dec!(1))
            .await
            .unwrap();
    }

    // Every source fails now; values must not move or zero out.
    let tracker = tracker_with_prices(store, &[]);
    let outcome = tracker.refresh(RefreshScope::Full).await.unwrap();
    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.failed, 1);
    assert_eq!(outcome.updated, 0);
    assert_eq!(tracker.portfolio_total(), dec!(40000));
}

#[tokio::test]
async fn refresh_with_no_ticker_assets_is_an_empty_cycle() {
    let tracker = tracker_with_prices(Arc::new(MemoryStore::new()), &[]);
    tracker.sign_up("alice", "a").unwrap();
    tracker
        .add_static_asset(Category::RealEstate, "House", dec!(350000))
        .unwrap();

    let outcome = tracker.manual_refresh().await.unwrap();
    assert_eq!(outcome.attempted, 0);
    assert!(!outcome.skipped);
    assert!(!tracker.is_refreshing());
}

#[tokio::test]
async fn unchanged_quotes_cause_no_persistence_write() {
    let store = Arc::new(CountingStore::default());
    {
        let tracker = tracker_with_prices(store.clone(), &[("BTC", dec!(40000))]);
        tracker.sign_up("alice", "a").unwrap();
        tracker
            .add_ticker_asset(Category::Crypto, "Bitcoin", "BTC", dec!(1))
            .await
            .unwrap();
    }

    // Same price as at creation: an idempotent cycle.
    let tracker = tracker_with_prices(store.clone(), &[("BTC", dec!(40000))]);
    let writes_before = store.portfolio_writes.load(Ordering::SeqCst);
    let outcome = tracker.refresh(RefreshScope::Full).await.unwrap();
    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.unchanged, 1);
    assert_eq!(outcome.updated, 0);
    assert!(tracker.snapshot().last_sync.is_none());
    assert_eq!(store.portfolio_writes.load(Ordering::SeqCst), writes_before);
}

/// Blocks inside fetch_quote until the test releases it, so the test can
/// act while a cycle or submission is mid-flight. Counts every fetch.
struct GatedProvider {
    entered: Arc<tokio::sync::Notify>,
    release: Arc<tokio::sync::Notify>,
    calls: Arc<AtomicUsize>,
    price: Decimal,
}

impl GatedProvider {
    fn registry(
        price: Decimal,
    ) -> (
        QuoteProviderRegistry,
        Arc<tokio::sync::Notify>,
        Arc<tokio::sync::Notify>,
        Arc<AtomicUsize>,
    ) {
        let entered = Arc::new(tokio::sync::Notify::new());
        let release = Arc::new(tokio::sync::Notify::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = QuoteProviderRegistry::new();
        registry.register(Box::new(GatedProvider {
            entered: entered.clone(),
            release: release.clone(),
            calls: calls.clone(),
            price,
        }));
        (registry, entered, release, calls)
    }
}

#[async_trait]
impl QuoteProvider for GatedProvider {
    fn name(&self) -> &str {
        "GatedProvider"
    }

    fn supported_asset_classes(&self) -> Vec<AssetClass> {
        vec![AssetClass::Equity, AssetClass::Crypto]
    }

    async fn fetch_quote(&self, _symbol: &str) -> Result<Decimal, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(self.price)
    }
}

#[tokio::test]
async fn stale_refresh_results_are_discarded_after_sign_out() {
    let store = Arc::new(MemoryStore::new());
    {
        let tracker = tracker_with_prices(store.clone(), &[("BTC", dec!(40000))]);
        tracker.sign_up("alice", "a").unwrap();
        tracker
            .add_ticker_asset(Category::Crypto, "Bitcoin", "BTC", dec!(1))
            .await
            .unwrap();
    }

    let (registry, entered, release, _calls) = GatedProvider::registry(dec!(50000));
    let tracker = Arc::new(NetWorthTracker::with_registry(
        store,
        registry,
        TrackerConfig::default(),
    ));

    let refresh = tokio::spawn({
        let tracker = tracker.clone();
        async move { tracker.refresh(RefreshScope::Full).await }
    });

    // The cycle is mid-fetch; supersede its session, then let it finish.
    entered.notified().await;
    tracker.sign_out().unwrap();
    release.notify_one();

    let outcome = refresh.await.unwrap().unwrap();
    assert!(outcome.skipped);
    assert_eq!(outcome.updated, 0);

    // The superseded user's holdings were never touched.
    tracker.sign_in("alice", "a").unwrap();
    assert_eq!(tracker.portfolio_total(), dec!(40000));
}

#[tokio::test]
async fn second_ticker_add_in_flight_is_a_duplicate_submission() {
    let (registry, entered, release, calls) = GatedProvider::registry(dec!(43500));
    let tracker = Arc::new(NetWorthTracker::with_registry(
        Arc::new(MemoryStore::new()),
        registry,
        TrackerConfig::default(),
    ));
    tracker.sign_up("alice", "a").unwrap();

    let first = tokio::spawn({
        let tracker = tracker.clone();
        async move {
            tracker
                .add_ticker_asset(Category::Crypto, "Bitcoin", "BTC", dec!(1))
                .await
        }
    });

    // The first add is mid-fetch; a second submission must be rejected
    // before it reaches any source.
    entered.notified().await;
    let err = tracker
        .add_ticker_asset(Category::Crypto, "Ethereum", "ETH", dec!(2))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::DuplicateSubmission));
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    release.notify_one();
    let id = first.await.unwrap().unwrap();
    assert!(id.is_some());
    assert_eq!(tracker.asset_count(), 1);

    // The guard lifted with the first add, so a later submission works.
    release.notify_one();
    tracker
        .add_ticker_asset(Category::Crypto, "Ethereum", "ETH", dec!(2))
        .await
        .unwrap();
    assert_eq!(tracker.asset_count(), 2);
}

#[tokio::test]
async fn manual_refresh_during_a_cycle_makes_no_provider_calls() {
    let store = Arc::new(MemoryStore::new());
    {
        let tracker = tracker_with_prices(store.clone(), &[("BTC", dec!(40000))]);
        tracker.sign_up("alice", "a").unwrap();
        tracker
            .add_ticker_asset(Category::Crypto, "Bitcoin", "BTC", dec!(1))
            .await
            .unwrap();
    }

    let (registry, entered, release, calls) = GatedProvider::registry(dec!(50000));
    let tracker = Arc::new(NetWorthTracker::with_registry(
        store,
        registry,
        TrackerConfig::default(),
    ));

    let refresh = tokio::spawn({
        let tracker = tracker.clone();
        async move { tracker.refresh(RefreshScope::Full).await }
    });

    // A manual trigger while the cycle is mid-fetch is a no-op: skipped
    // outcome, zero additional source calls.
    entered.notified().await;
    assert!(tracker.is_refreshing());
    let calls_before = calls.load(Ordering::SeqCst);
    let manual = tracker.manual_refresh().await.unwrap();
    assert!(manual.skipped);
    assert_eq!(manual.attempted, 0);
    assert_eq!(calls.load(Ordering::SeqCst), calls_before);

    // The original cycle still completes normally.
    release.notify_one();
    let outcome = refresh.await.unwrap().unwrap();
    assert_eq!(outcome.updated, 1);
    assert_eq!(tracker.portfolio_total(), dec!(50000));
}

// ═══════════════════════════════════════════════════════════════════
// Backup & read accessors
// ═══════════════════════════════════════════════════════════════════

#[test]
fn backup_roundtrips_through_the_facade() {
    let tracker = tracker_with_prices(Arc::new(MemoryStore::new()), &[]);
    tracker.sign_up("alice", "a").unwrap();
    tracker
        .add_static_asset(Category::Savings, "Emergency fund", dec!(5000))
        .unwrap();
    tracker
        .add_static_asset(Category::Vehicles, "Car", dec!(18000))
        .unwrap();

    let json = tracker.export_backup().unwrap();

    // Wipe and restore.
    let total_before = tracker.portfolio_total();
    let ids: Vec<_> = tracker
        .assets_in(Category::Savings)
        .iter()
        .map(|a| a.id)
        .collect();
    for id in ids {
        tracker.delete_asset(Category::Savings, id).unwrap();
    }
    assert_ne!(tracker.portfolio_total(), total_before);

    let imported = tracker.import_backup(&json).unwrap();
    assert_eq!(imported, 2);
    assert_eq!(tracker.portfolio_total(), total_before);
}

#[test]
fn invalid_backup_leaves_state_untouched() {
    let tracker = tracker_with_prices(Arc::new(MemoryStore::new()), &[]);
    tracker.sign_up("alice", "a").unwrap();
    tracker
        .add_static_asset(Category::Other, "Keep me", dec!(1000))
        .unwrap();

    assert!(matches!(
        tracker.import_backup("{\"wrong\": true}"),
        Err(CoreError::InvalidBackup(_))
    ));
    assert_eq!(tracker.portfolio_total(), dec!(1000));
}

#[test]
fn chart_series_tracks_the_live_total() {
    let tracker = tracker_with_prices(Arc::new(MemoryStore::new()), &[]);
    tracker
        .add_static_asset(Category::Savings, "Fund", dec!(10000))
        .unwrap();

    let series = tracker.chart_series(Timeframe::Week);
    assert_eq!(series.len(), 7);
    assert_eq!(series.last().unwrap().value, dec!(10000));
}
