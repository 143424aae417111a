pub mod errors;
pub mod models;
pub mod providers;
pub mod services;
pub mod storage;

use chrono::{Local, Utc};
use futures::future::join_all;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use errors::CoreError;
use models::{
    analytics::PortfolioSnapshot,
    asset::{Asset, Category},
    chart::{ChartPoint, Timeframe},
    portfolio::Portfolio,
};
use providers::registry::QuoteProviderRegistry;
use services::{
    chart_service::ChartService,
    quote_service::QuoteService,
    refresh_service::{
        apply_quote, collect_jobs, RefreshConfig, RefreshOutcome, RefreshScheduler, RefreshScope,
    },
    session_service::SessionService,
    valuation_service::ValuationService,
};
use storage::{backup, portfolio_store::PortfolioStore, store::KeyValueStore};

/// Tracker-level configuration.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Categories allowed to hold ticker-backed assets. Which
    /// categories are ticker-eligible is deliberately configuration —
    /// e.g. a Roth account may be tracked statically or by ticker
    /// depending on the deployment.
    pub ticker_categories: BTreeSet<Category>,
    pub refresh: RefreshConfig,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ticker_categories: BTreeSet::from([Category::Stocks, Category::Crypto]),
            refresh: RefreshConfig::default(),
        }
    }
}

/// The active session: who is signed in and their in-memory portfolio.
///
/// `generation` increments on every user switch; asynchronous work
/// captures it before suspending and discards its results if the value
/// moved, so a late quote can never land in the wrong user's portfolio.
struct SessionState {
    user_key: Option<String>,
    generation: u64,
    portfolio: Portfolio,
}

/// Main entry point for the net worth tracker core.
///
/// A session-scoped object owning the active user's portfolio and every
/// service that operates on it. Methods take `&self` so a scheduler
/// task, a manual refresh, and user actions can share one handle; all
/// portfolio mutation serializes through the internal state lock.
#[must_use]
pub struct NetWorthTracker {
    state: Mutex<SessionState>,
    store: PortfolioStore,
    sessions: SessionService,
    quotes: QuoteService,
    valuation: ValuationService,
    charts: ChartService,
    scheduler: RefreshScheduler,
    /// Guards the async add-asset path against duplicate submission
    /// (double-click, duplicate event binding).
    submit_in_flight: AtomicBool,
    ticker_categories: BTreeSet<Category>,
}

impl std::fmt::Debug for NetWorthTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock_state();
        f.debug_struct("NetWorthTracker")
            .field("user", &state.user_key)
            .field("assets", &state.portfolio.asset_count())
            .field("refreshing", &self.scheduler.is_refreshing())
            .finish()
    }
}

impl NetWorthTracker {
    /// Tracker over the given storage substrate with the default quote
    /// source chain and configuration.
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, TrackerConfig::default())
    }

    pub fn with_config(store: Arc<dyn KeyValueStore>, config: TrackerConfig) -> Self {
        Self::with_registry(store, QuoteProviderRegistry::new_with_defaults(), config)
    }

    /// Full-control constructor — tests inject mock providers here.
    pub fn with_registry(
        store: Arc<dyn KeyValueStore>,
        registry: QuoteProviderRegistry,
        config: TrackerConfig,
    ) -> Self {
        let store = PortfolioStore::new(store);

        // Restore the persisted active session, if any. Anonymous
        // sessions start from the transient empty default.
        let user_key = store.load_active_user();
        let portfolio = match &user_key {
            Some(key) => store.load(key),
            None => Portfolio::default(),
        };

        Self {
            state: Mutex::new(SessionState {
                user_key,
                generation: 0,
                portfolio,
            }),
            sessions: SessionService::new(store.clone()),
            store,
            quotes: QuoteService::new(registry),
            valuation: ValuationService::new(),
            charts: ChartService::new(),
            scheduler: RefreshScheduler::new(config.refresh),
            submit_in_flight: AtomicBool::new(false),
            ticker_categories: config.ticker_categories,
        }
    }

    // ── Session ─────────────────────────────────────────────────────

    /// The active user key, or `None` for an anonymous session.
    pub fn active_user(&self) -> Option<String> {
        self.lock_state().user_key.clone()
    }

    /// Register a new user and switch to their (empty) portfolio.
    /// The fresh portfolio is persisted immediately so the user's
    /// record exists before any asset write.
    pub fn sign_up(&self, key: &str, secret: &str) -> Result<(), CoreError> {
        let key = self.sessions.sign_up(key, secret)?;
        let portfolio = self.store.load(&key);
        self.store.save(&key, &portfolio)?;

        let mut state = self.lock_state();
        state.generation += 1;
        state.user_key = Some(key);
        state.portfolio = portfolio;
        Ok(())
    }

    /// Validate credentials and switch to that user's portfolio,
    /// fully replacing in-memory state — no merge.
    pub fn sign_in(&self, key: &str, secret: &str) -> Result<(), CoreError> {
        let key = self.sessions.sign_in(key, secret)?;
        let portfolio = self.store.load(&key);

        let mut state = self.lock_state();
        state.generation += 1;
        state.user_key = Some(key);
        state.portfolio = portfolio;
        Ok(())
    }

    /// Clear the session and reset to the anonymous default. In-flight
    /// refresh results for the previous user are invalidated.
    pub fn sign_out(&self) -> Result<(), CoreError> {
        self.sessions.sign_out()?;

        let mut state = self.lock_state();
        state.generation += 1;
        state.user_key = None;
        state.portfolio = Portfolio::default();
        Ok(())
    }

    // ── Assets ──────────────────────────────────────────────────────

    /// Add a static-value asset. Validation failures surface to the
    /// caller; nothing is mutated on rejection.
    pub fn add_static_asset(
        &self,
        category: Category,
        name: &str,
        value: Decimal,
    ) -> Result<Uuid, CoreError> {
        let asset = Asset::new_static(name, category, value)?;
        let id = asset.id;

        let mut state = self.lock_state();
        state.portfolio.add(asset);
        self.persist(&state)?;
        Ok(id)
    }

    /// Add a ticker-backed asset, resolving its creation price through
    /// the quote adapter.
    ///
    /// A second call arriving while one is in flight fails with
    /// `DuplicateSubmission` — callers discard it silently. Returns
    /// `Ok(None)` if the active user changed while the quote was in
    /// flight (the submission is dropped rather than written into the
    /// wrong portfolio).
    pub async fn add_ticker_asset(
        &self,
        category: Category,
        name: &str,
        ticker: &str,
        quantity: Decimal,
    ) -> Result<Option<Uuid>, CoreError> {
        if !self.ticker_categories.contains(&category) {
            return Err(CoreError::InvalidAssetInput(format!(
                "Category {category} does not allow ticker-backed assets"
            )));
        }

        if self.submit_in_flight.swap(true, Ordering::SeqCst) {
            return Err(CoreError::DuplicateSubmission);
        }
        let _guard = SubmitGuard {
            flag: &self.submit_in_flight,
        };

        let generation = self.lock_state().generation;

        // Suspension point: the session may change underneath us here.
        let price = self
            .quotes
            .get_price(ticker, category.asset_class())
            .await?;

        let asset = Asset::new_ticker(name, category, ticker, quantity, price)?;
        let id = asset.id;

        let mut state = self.lock_state();
        if state.generation != generation {
            info!("Discarding add of {ticker}: session changed during price fetch");
            return Ok(None);
        }
        state.portfolio.add(asset);
        self.persist(&state)?;
        Ok(Some(id))
    }

    /// Delete an asset by id. Returns whether anything was removed.
    pub fn delete_asset(&self, category: Category, id: Uuid) -> Result<bool, CoreError> {
        let mut state = self.lock_state();
        let removed = state.portfolio.remove(category, id).is_some();
        if removed {
            self.persist(&state)?;
        }
        Ok(removed)
    }

    /// Assets in one category, in display order.
    pub fn assets_in(&self, category: Category) -> Vec<Asset> {
        self.lock_state().portfolio.assets_in(category).to_vec()
    }

    pub fn asset_count(&self) -> usize {
        self.lock_state().portfolio.asset_count()
    }

    // ── Valuation ───────────────────────────────────────────────────

    pub fn portfolio_total(&self) -> Decimal {
        let state = self.lock_state();
        self.valuation.portfolio_total(&state.portfolio)
    }

    pub fn category_total(&self, category: Category) -> Decimal {
        let state = self.lock_state();
        self.valuation.category_total(&state.portfolio, category)
    }

    /// Checking + savings combined — the display layer's "Cash" figure.
    pub fn cash_total(&self) -> Decimal {
        let state = self.lock_state();
        self.valuation.cash_total(&state.portfolio)
    }

    /// Full rendering-boundary snapshot: totals, breakdown slices, and
    /// per-asset rows with last-refresh deltas.
    pub fn snapshot(&self) -> PortfolioSnapshot {
        let state = self.lock_state();
        self.valuation.snapshot(&state.portfolio)
    }

    /// Synthetic chart series for the selected timeframe. A documented
    /// placeholder around the live total, not historical market data.
    pub fn chart_series(&self, timeframe: Timeframe) -> Vec<ChartPoint> {
        let total = self.portfolio_total();
        self.charts.generate_series(total, timeframe, Utc::now())
    }

    // ── Price refresh ───────────────────────────────────────────────

    /// Run one refresh cycle over the given scope.
    ///
    /// At most one cycle runs at a time; a request while one is in
    /// flight returns a skipped outcome without touching any source.
    /// Per-asset fetches run concurrently and settle independently —
    /// one failure never aborts the rest. After the batch settles, the
    /// portfolio is persisted once (and only if something changed).
    pub async fn refresh(&self, scope: RefreshScope) -> Result<RefreshOutcome, CoreError> {
        let Some(_guard) = self.scheduler.try_begin() else {
            debug!("Refresh requested while a cycle is in flight — skipping");
            return Ok(RefreshOutcome::skipped());
        };

        let (generation, jobs) = {
            let state = self.lock_state();
            (state.generation, collect_jobs(&state.portfolio, scope))
        };
        if jobs.is_empty() {
            return Ok(RefreshOutcome::default());
        }

        let fetches = jobs.into_iter().map(|job| async move {
            let result = self.quotes.get_price(&job.ticker, job.asset_class).await;
            (job, result)
        });
        let results = join_all(fetches).await;

        let now = Utc::now();
        let mut outcome = RefreshOutcome {
            attempted: results.len(),
            ..RefreshOutcome::default()
        };

        let mut state = self.lock_state();
        if state.generation != generation {
            info!("Discarding refresh batch: session changed mid-cycle");
            return Ok(RefreshOutcome::skipped());
        }

        for (job, result) in results {
            match result {
                Ok(price) => {
                    // The asset may have been deleted while the fetch
                    // was in flight; a quote for a gone asset is dropped.
                    if let Some(asset) = state.portfolio.find_mut(job.category, job.id) {
                        if apply_quote(asset, price, now) {
                            outcome.updated += 1;
                        } else {
                            outcome.unchanged += 1;
                        }
                    }
                }
                Err(e) => {
                    debug!("Quote unavailable for {}: {e}", job.ticker);
                    outcome.failed += 1;
                }
            }
        }

        if outcome.updated > 0 {
            state.portfolio.last_sync = Some(now);
            self.persist(&state)?;
        }
        Ok(outcome)
    }

    /// User-initiated immediate refresh. Same mutual exclusion as the
    /// periodic cycles; the outcome's failure count is what a UI would
    /// surface as a recoverable notice.
    pub async fn manual_refresh(&self) -> Result<RefreshOutcome, CoreError> {
        self.refresh(RefreshScope::Full).await
    }

    /// Call when the consuming surface becomes active again after being
    /// hidden: schedules one immediate full refresh.
    pub async fn resume(&self) -> Result<RefreshOutcome, CoreError> {
        self.refresh(RefreshScope::Full).await
    }

    pub fn is_refreshing(&self) -> bool {
        self.scheduler.is_refreshing()
    }

    /// Drive the periodic cycles forever: a full refresh on the
    /// configured interval (throttled outside the market window) and a
    /// faster crypto-only cycle. Run as a background task; cancel by
    /// dropping the task.
    pub async fn run_scheduler(self: Arc<Self>) {
        let config = self.scheduler.config().clone();
        let mut full = tokio::time::interval(config.full_interval);
        full.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut crypto = tokio::time::interval(config.crypto_interval);
        crypto.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = full.tick() => {
                    if self.scheduler.should_run_full_tick(Local::now()) {
                        if let Err(e) = self.refresh(RefreshScope::Full).await {
                            warn!("Full refresh cycle failed: {e}");
                        }
                    }
                }
                _ = crypto.tick() => {
                    if let Err(e) = self.refresh(RefreshScope::CryptoOnly).await {
                        warn!("Crypto refresh cycle failed: {e}");
                    }
                }
            }
        }
    }

    // ── Backup ──────────────────────────────────────────────────────

    /// Export the active portfolio as a self-describing JSON snapshot.
    pub fn export_backup(&self) -> Result<String, CoreError> {
        let state = self.lock_state();
        backup::write_backup(&state.portfolio)
    }

    /// Validate and import a backup document, replacing the active
    /// portfolio. Nothing is overwritten if validation fails. Returns
    /// the number of assets imported.
    pub fn import_backup(&self, json: &str) -> Result<usize, CoreError> {
        let snapshot = backup::read_backup(json)?;
        let portfolio = backup::restore_portfolio(snapshot);
        let count = portfolio.asset_count();

        let mut state = self.lock_state();
        state.portfolio = portfolio;
        self.persist(&state)?;
        Ok(count)
    }

    // ── Internal ────────────────────────────────────────────────────

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Persist the active portfolio under the active user key.
    /// Anonymous sessions are transient and never written — a later
    /// signed-in user must not inherit anonymous state.
    fn persist(&self, state: &SessionState) -> Result<(), CoreError> {
        match &state.user_key {
            Some(key) => self.store.save(key, &state.portfolio),
            None => Ok(()),
        }
    }
}

struct SubmitGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
