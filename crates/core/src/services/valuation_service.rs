use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::models::analytics::{AssetSummary, CategoryBreakdown, DailyChange, PortfolioSnapshot};
use crate::models::asset::{Category, Valuation};
use crate::models::portfolio::Portfolio;

/// Placeholder daily movement rate (1.91 %). The tracker keeps no price
/// history, so the displayed "daily change" is a fixed simulation, not
/// real performance.
pub const DAILY_CHANGE_RATE: Decimal = dec!(0.0191);

/// Computes per-asset, per-category, and total portfolio value.
///
/// Pure arithmetic over `&Portfolio` — no I/O, no API calls. All sums
/// stay in full decimal precision; rounding to 2 places is the
/// rendering layer's job.
pub struct ValuationService;

impl ValuationService {
    pub fn new() -> Self {
        Self
    }

    /// Current value of one asset. Ticker-backed values are recomputed
    /// from `last_price × quantity` on every call — there is no stored
    /// value to go stale.
    pub fn asset_value(&self, asset: &crate::models::asset::Asset) -> Decimal {
        asset.current_value()
    }

    /// Sum of asset values in one category. Zero for an empty category.
    pub fn category_total(&self, portfolio: &Portfolio, category: Category) -> Decimal {
        portfolio
            .assets_in(category)
            .iter()
            .map(|a| a.current_value())
            .sum()
    }

    /// Sum of all category totals.
    pub fn portfolio_total(&self, portfolio: &Portfolio) -> Decimal {
        Category::ALL
            .iter()
            .map(|&c| self.category_total(portfolio, c))
            .sum()
    }

    /// Checking + savings surfaced as one logical "Cash" figure.
    /// A display grouping only — storage keeps the two categories apart.
    pub fn cash_total(&self, portfolio: &Portfolio) -> Decimal {
        self.category_total(portfolio, Category::Checking)
            + self.category_total(portfolio, Category::Savings)
    }

    /// Simulated daily movement of the total (see `DAILY_CHANGE_RATE`).
    pub fn daily_change(&self, portfolio: &Portfolio) -> DailyChange {
        let total = self.portfolio_total(portfolio);
        DailyChange {
            amount: total * DAILY_CHANGE_RATE,
            percent: DAILY_CHANGE_RATE * dec!(100),
        }
    }

    /// Everything the rendering layer needs after a state change:
    /// total, cash figure, simulated daily change, breakdown slices
    /// (checking/savings merged into "Cash"), and per-asset rows with
    /// last-refresh deltas. Slices and rows sorted by descending value.
    pub fn snapshot(&self, portfolio: &Portfolio) -> PortfolioSnapshot {
        let mut categories: Vec<CategoryBreakdown> = Category::ALL
            .iter()
            .filter(|c| !matches!(c, Category::Checking | Category::Savings))
            .map(|&c| CategoryBreakdown {
                category: Some(c),
                label: c.label().to_string(),
                total: self.category_total(portfolio, c),
            })
            .collect();
        categories.push(CategoryBreakdown {
            category: None,
            label: "Cash".to_string(),
            total: self.cash_total(portfolio),
        });
        categories.sort_by(|a, b| b.total.cmp(&a.total));

        let mut assets: Vec<AssetSummary> = portfolio
            .iter_assets()
            .map(|a| {
                let (ticker, last_price, price_change, percent_change, updated) =
                    match &a.valuation {
                        Valuation::TickerBacked {
                            ticker,
                            last_price,
                            last_price_change,
                            last_percent_change,
                            last_updated,
                            ..
                        } => (
                            Some(ticker.clone()),
                            Some(*last_price),
                            *last_price_change,
                            *last_percent_change,
                            *last_updated,
                        ),
                        Valuation::Static { .. } => (None, None, None, None, None),
                    };
                AssetSummary {
                    id: a.id,
                    name: a.name.clone(),
                    category: a.category,
                    value: a.current_value(),
                    ticker,
                    last_price,
                    last_price_change: price_change,
                    last_percent_change: percent_change,
                    last_updated: updated,
                }
            })
            .collect();
        assets.sort_by(|a, b| b.value.cmp(&a.value));

        PortfolioSnapshot {
            total_value: self.portfolio_total(portfolio),
            cash_total: self.cash_total(portfolio),
            daily_change: self.daily_change(portfolio),
            categories,
            assets,
            last_sync: portfolio.last_sync,
        }
    }
}

impl Default for ValuationService {
    fn default() -> Self {
        Self::new()
    }
}
