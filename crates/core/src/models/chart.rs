use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Timeframe selector for the synthetic chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    /// 24 hourly points
    Day,
    /// 7 daily points
    Week,
    /// 30 daily points
    Month,
    /// 12 monthly points
    Year,
}

impl Timeframe {
    /// Number of points in the series.
    pub fn point_count(&self) -> usize {
        match self {
            Timeframe::Day => 24,
            Timeframe::Week => 7,
            Timeframe::Month => 30,
            Timeframe::Year => 12,
        }
    }

    /// Spacing between points.
    pub fn step(&self) -> chrono::Duration {
        match self {
            Timeframe::Day => chrono::Duration::hours(1),
            Timeframe::Week | Timeframe::Month => chrono::Duration::days(1),
            Timeframe::Year => chrono::Duration::days(30),
        }
    }
}

/// One point of a chart series: raw decimal value plus a plain
/// timestamp. Formatting belongs to the rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp: DateTime<Utc>,
    pub value: Decimal,
}
