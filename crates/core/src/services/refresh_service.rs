use chrono::{DateTime, Datelike, Local, Timelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::models::asset::{Asset, AssetClass, Category, Valuation};
use crate::models::portfolio::Portfolio;

/// Time-of-day / day-of-week predicate for the full-refresh cadence.
/// Outside this window the full cycle runs at a reduced rate. A policy
/// knob only — correctness never depends on it.
#[derive(Debug, Clone)]
pub struct MarketWindow {
    /// First hour (local time) considered active, inclusive.
    pub open_hour: u32,
    /// Last hour (local time) considered active, inclusive.
    pub close_hour: u32,
    /// Skip Saturday/Sunday entirely.
    pub weekdays_only: bool,
}

impl Default for MarketWindow {
    fn default() -> Self {
        Self {
            open_hour: 9,
            close_hour: 16,
            weekdays_only: true,
        }
    }
}

impl MarketWindow {
    pub fn contains(&self, now: DateTime<Local>) -> bool {
        if self.weekdays_only {
            let weekday = now.weekday();
            if weekday == chrono::Weekday::Sat || weekday == chrono::Weekday::Sun {
                return false;
            }
        }
        let hour = now.hour();
        hour >= self.open_hour && hour <= self.close_hour
    }
}

/// Scheduler timing knobs.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Cadence of the full refresh tick.
    pub full_interval: Duration,
    /// Cadence of the crypto-only refresh (24/7 markets move faster).
    pub crypto_interval: Duration,
    /// Outside the market window, run the full cycle only every Nth
    /// tick. Deterministic throttle.
    pub off_hours_divisor: u64,
    pub market_window: MarketWindow,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            full_interval: Duration::from_secs(30),
            crypto_interval: Duration::from_secs(15),
            off_hours_divisor: 5,
            market_window: MarketWindow::default(),
        }
    }
}

/// Which ticker-backed assets a cycle covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshScope {
    /// All ticker-backed assets across categories.
    Full,
    /// The crypto category only.
    CryptoOnly,
}

/// Aggregate result of one refresh cycle. Per-asset failures surface
/// only in these counts, never as an error.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshOutcome {
    /// Number of ticker-backed assets the cycle attempted.
    pub attempted: usize,
    /// Assets whose price changed and were rewritten.
    pub updated: usize,
    /// Assets whose quote came back unchanged (no mutation).
    pub unchanged: usize,
    /// Assets whose quote was unavailable (left untouched).
    pub failed: usize,
    /// True when the request was a no-op because a cycle was already in
    /// flight, or its results were discarded after a user switch.
    pub skipped: bool,
}

impl RefreshOutcome {
    pub fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// One unit of work for a cycle: enough of an asset to fetch its quote
/// without holding the portfolio lock across the network call.
#[derive(Debug, Clone)]
pub struct RefreshJob {
    pub category: Category,
    pub id: Uuid,
    pub ticker: String,
    pub asset_class: AssetClass,
}

/// Snapshot the ticker-backed assets a cycle should attempt.
pub fn collect_jobs(portfolio: &Portfolio, scope: RefreshScope) -> Vec<RefreshJob> {
    portfolio
        .iter_assets()
        .filter(|a| scope == RefreshScope::Full || a.category == Category::Crypto)
        .filter_map(|a| {
            let ticker = a.ticker()?;
            Some(RefreshJob {
                category: a.category,
                id: a.id,
                ticker: ticker.to_string(),
                asset_class: a.asset_class(),
            })
        })
        .collect()
}

/// Apply one fetched quote to an asset. Returns `true` if the asset was
/// mutated.
///
/// - Non-ticker assets and non-positive prices: untouched.
/// - Unchanged price: untouched — no timestamp churn, no redundant write.
/// - Changed price: rewrite `last_price`, record the absolute and
///   relative deltas (relative is 0 when the previous price was 0), and
///   stamp `last_updated`. The asset's value follows automatically
///   because it is derived from `last_price × quantity`.
pub fn apply_quote(asset: &mut Asset, price: Decimal, now: DateTime<Utc>) -> bool {
    let Valuation::TickerBacked {
        last_price,
        last_price_change,
        last_percent_change,
        last_updated,
        ..
    } = &mut asset.valuation
    else {
        return false;
    };

    if price <= Decimal::ZERO || price == *last_price {
        return false;
    }

    let change = price - *last_price;
    let percent = if *last_price > Decimal::ZERO {
        change / *last_price * dec!(100)
    } else {
        Decimal::ZERO
    };

    *last_price = price;
    *last_price_change = Some(change);
    *last_percent_change = Some(percent);
    *last_updated = Some(now);
    true
}

/// Mutual-exclusion gate for refresh cycles.
///
/// At most one cycle — full, crypto-only, or manual — is in flight at
/// any time; a request arriving while one runs is a no-op, not queued.
/// Serializing crypto-only and full cycles through the same flag also
/// keeps them from racing on the same asset.
pub struct RefreshScheduler {
    in_flight: AtomicBool,
    full_ticks: AtomicU64,
    config: RefreshConfig,
}

impl RefreshScheduler {
    pub fn new(config: RefreshConfig) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            full_ticks: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    pub fn is_refreshing(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Attempt the Idle → Refreshing transition. `None` means a cycle
    /// is already in flight and the caller must not start another.
    pub fn try_begin(&self) -> Option<InFlightGuard<'_>> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(InFlightGuard {
            flag: &self.in_flight,
        })
    }

    /// Whether this full-refresh tick should run, applying the
    /// off-hours throttle outside the market window.
    pub fn should_run_full_tick(&self, now: DateTime<Local>) -> bool {
        let tick = self.full_ticks.fetch_add(1, Ordering::SeqCst);
        if self.config.market_window.contains(now) {
            return true;
        }
        self.config.off_hours_divisor <= 1 || tick % self.config.off_hours_divisor == 0
    }
}

/// RAII release of the Refreshing state — the flag drops back to Idle
/// on every exit path of a cycle, including errors.
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}
