use super::Classification;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Price and RSI at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price: f64,
    pub rsi: f64,
}

/// MACD line, signal line and their difference.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdPoint {
    pub time: DateTime<Utc>,
    pub macd: f64,
    pub signal_line: f64,
    /// `macd - signal_line`
    pub histogram: f64,
}

/// Signal confidence as a percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidencePoint {
    pub time: DateTime<Utc>,
    pub confidence_percent: f64,
    pub classification: Classification,
}

/// Display series projected from a signal history, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub price: Vec<PricePoint>,
    pub macd: Vec<MacdPoint>,
    pub confidence: Vec<ConfidencePoint>,
}

impl ChartSeries {
    /// Number of points per series.
    pub fn len(&self) -> usize {
        self.price.len()
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_empty() && self.macd.is_empty() && self.confidence.is_empty()
    }
}
