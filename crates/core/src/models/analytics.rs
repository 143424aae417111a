use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::asset::Category;

/// Simulated daily movement of the whole portfolio.
///
/// This is a placeholder derived from a fixed rate, NOT real market
/// performance — the tracker keeps no price history to compute one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyChange {
    pub amount: Decimal,
    pub percent: Decimal,
}

/// One slice of the category breakdown. Checking and savings are merged
/// into a single logical "Cash" slice for display; `category` is `None`
/// for that merged slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub category: Option<Category>,
    pub label: String,
    pub total: Decimal,
}

/// Per-asset display row: current value plus the deltas recorded by the
/// last refresh that observed a price change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSummary {
    pub id: uuid::Uuid,
    pub name: String,
    pub category: Category,
    pub value: Decimal,
    pub ticker: Option<String>,
    pub last_price: Option<Decimal>,
    pub last_price_change: Option<Decimal>,
    pub last_percent_change: Option<Decimal>,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Everything the rendering layer needs after any state change.
/// Raw decimals throughout — rounding happens at format time only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub total_value: Decimal,
    pub cash_total: Decimal,
    pub daily_change: DailyChange,
    /// Breakdown slices sorted by descending total.
    pub categories: Vec<CategoryBreakdown>,
    /// All assets sorted by descending value.
    pub assets: Vec<AssetSummary>,
    pub last_sync: Option<DateTime<Utc>>,
}
