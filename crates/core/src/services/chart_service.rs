use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::chart::{ChartPoint, Timeframe};

/// Amplitude of the synthetic wobble around the live total (±5 %).
const WOBBLE_AMPLITUDE: f64 = 0.05;

/// Generates the synthetic chart series for the selected timeframe.
///
/// The tracker persists no price history, so the series is a
/// deterministic sine wobble around the current portfolio total — a
/// clearly-labeled presentational placeholder, not market data. The
/// final point is always the exact live total.
pub struct ChartService;

impl ChartService {
    pub fn new() -> Self {
        Self
    }

    pub fn generate_series(
        &self,
        total: Decimal,
        timeframe: Timeframe,
        now: DateTime<Utc>,
    ) -> Vec<ChartPoint> {
        let n = timeframe.point_count();
        let step = timeframe.step();

        (0..n)
            .map(|i| {
                let timestamp = now - step * ((n - 1 - i) as i32);
                let value = if i == n - 1 {
                    total
                } else {
                    let factor = 1.0 + WOBBLE_AMPLITUDE * (i as f64 * 0.3).sin();
                    total * Decimal::from_f64_retain(factor).unwrap_or(Decimal::ONE)
                };
                ChartPoint { timestamp, value }
            })
            .collect()
    }
}

impl Default for ChartService {
    fn default() -> Self {
        Self::new()
    }
}
