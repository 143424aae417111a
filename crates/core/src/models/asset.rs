use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::CoreError;

/// The category a holding is filed under. Fixed set — assigned at
/// creation and immutable afterwards (moving an asset between
/// categories is delete + recreate).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Stocks,
    Roth,
    Checking,
    Savings,
    Crypto,
    RealEstate,
    Vehicles,
    Other,
}

impl Category {
    /// All categories, in display order.
    pub const ALL: [Category; 8] = [
        Category::Stocks,
        Category::Roth,
        Category::Checking,
        Category::Savings,
        Category::Crypto,
        Category::RealEstate,
        Category::Vehicles,
        Category::Other,
    ];

    /// Which quote-provider family serves tickers in this category.
    pub fn asset_class(&self) -> AssetClass {
        match self {
            Category::Crypto => AssetClass::Crypto,
            _ => AssetClass::Equity,
        }
    }

    /// Display label for the rendering layer.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Stocks => "Stocks",
            Category::Roth => "Roth IRA",
            Category::Checking => "Checking",
            Category::Savings => "Savings",
            Category::Crypto => "Crypto",
            Category::RealEstate => "Real Estate",
            Category::Vehicles => "Vehicles",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which family of external price sources a ticker belongs to.
/// Determines cache TTL and symbol-normalization rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetClass {
    /// Stocks / equities (AAPL, MSFT, …)
    Equity,
    /// Cryptocurrencies (BTC, ETH, …)
    Crypto,
}

impl std::fmt::Display for AssetClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetClass::Equity => write!(f, "Equity"),
            AssetClass::Crypto => write!(f, "Crypto"),
        }
    }
}

/// How an asset is valued.
///
/// The current value is always *derived* from this variant, never stored
/// alongside it — a ticker-backed asset's value can therefore never go
/// stale relative to its last fetched price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Valuation {
    /// User-entered fixed value.
    Static { value: Decimal },
    /// Value derives from quantity × the most recently fetched price.
    TickerBacked {
        /// Normalized uppercase symbol (e.g. "AAPL", "BTC").
        ticker: String,
        /// Shares or amount held. Always positive.
        quantity: Decimal,
        /// Most recently fetched price. Zero only if never refreshed.
        last_price: Decimal,
        /// Absolute price delta recorded by the last refresh that
        /// observed a change.
        #[serde(default)]
        last_price_change: Option<Decimal>,
        /// Relative delta in percent (0 when the previous price was 0).
        #[serde(default)]
        last_percent_change: Option<Decimal>,
        /// Timestamp of the last successful refresh.
        #[serde(default)]
        last_updated: Option<DateTime<Utc>>,
    },
}

/// One holding within a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    /// Unique identifier, assigned at creation, immutable.
    pub id: Uuid,

    /// Display label.
    pub name: String,

    /// Category this asset is filed under. Immutable.
    pub category: Category,

    /// Static or ticker-backed valuation.
    pub valuation: Valuation,

    /// Creation timestamp. Immutable.
    pub date_added: DateTime<Utc>,
}

impl Asset {
    /// Construct a validated static-value asset.
    ///
    /// Rejects an empty name or a non-positive value. Pure — no side
    /// effects beyond id/timestamp assignment.
    pub fn new_static(
        name: impl Into<String>,
        category: Category,
        value: Decimal,
    ) -> Result<Self, CoreError> {
        let name = validate_name(name.into())?;
        if value <= Decimal::ZERO {
            return Err(CoreError::InvalidAssetInput(format!(
                "Static value must be positive, got {value}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            category,
            valuation: Valuation::Static { value },
            date_added: Utc::now(),
        })
    }

    /// Construct a validated ticker-backed asset from a resolved
    /// creation-time price.
    ///
    /// Rejects an empty name or ticker, non-positive quantity, or a
    /// non-positive resolved price. The ticker is stored uppercased.
    pub fn new_ticker(
        name: impl Into<String>,
        category: Category,
        ticker: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
    ) -> Result<Self, CoreError> {
        let name = validate_name(name.into())?;
        let ticker = ticker.into().trim().to_uppercase();
        if ticker.is_empty() {
            return Err(CoreError::InvalidAssetInput(
                "Ticker symbol must not be empty".into(),
            ));
        }
        if quantity <= Decimal::ZERO {
            return Err(CoreError::InvalidAssetInput(format!(
                "Quantity must be positive, got {quantity}"
            )));
        }
        if price <= Decimal::ZERO {
            return Err(CoreError::InvalidAssetInput(format!(
                "Resolved price must be positive, got {price}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            category,
            valuation: Valuation::TickerBacked {
                ticker,
                quantity,
                last_price: price,
                last_price_change: None,
                last_percent_change: None,
                last_updated: None,
            },
            date_added: Utc::now(),
        })
    }

    /// Current value: the static value, or `last_price × quantity` for
    /// ticker-backed assets. Never negative.
    pub fn current_value(&self) -> Decimal {
        match &self.valuation {
            Valuation::Static { value } => *value,
            Valuation::TickerBacked {
                quantity,
                last_price,
                ..
            } => *last_price * *quantity,
        }
    }

    /// The ticker symbol, if this asset is ticker-backed.
    pub fn ticker(&self) -> Option<&str> {
        match &self.valuation {
            Valuation::TickerBacked { ticker, .. } => Some(ticker),
            Valuation::Static { .. } => None,
        }
    }

    /// The asset class used for quote lookups, derived from the category.
    pub fn asset_class(&self) -> AssetClass {
        self.category.asset_class()
    }
}

fn validate_name(name: String) -> Result<String, CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidAssetInput(
            "Asset name must not be empty".into(),
        ));
    }
    Ok(trimmed.to_string())
}
