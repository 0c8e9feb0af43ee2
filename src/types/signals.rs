use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Number of history rows shown in the history table.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Directional classification of a trading signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Classification {
    Buy,
    Sell,
    Hold,
}

impl Classification {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "buy" => Some(Self::Buy),
            "sell" => Some(Self::Sell),
            "hold" => Some(Self::Hold),
            _ => None,
        }
    }

    /// Get display label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "Buy",
            Self::Sell => "Sell",
            Self::Hold => "Hold",
        }
    }
}

impl TryFrom<String> for Classification {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value).ok_or_else(|| format!("unknown signal classification: {}", value))
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Technical readings attached to a signal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Indicators {
    /// RSI (14).
    pub rsi: f64,
    pub macd: f64,
    pub macd_signal: f64,
    /// Position within the Bollinger bands, 0 = lower band, 1 = upper band.
    pub bb_position: f64,
    pub sma_20: f64,
    pub sma_50: f64,
    pub price: f64,
}

impl Indicators {
    pub fn rsi_zone(&self) -> RsiZone {
        RsiZone::from_rsi(self.rsi)
    }

    pub fn macd_bias(&self) -> MacdBias {
        if self.macd > self.macd_signal {
            MacdBias::Bullish
        } else {
            MacdBias::Bearish
        }
    }

    pub fn band_position(&self) -> BandPosition {
        BandPosition::from_position(self.bb_position)
    }
}

/// RSI overbought/oversold zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn from_rsi(rsi: f64) -> Self {
        if rsi > 70.0 {
            Self::Overbought
        } else if rsi < 30.0 {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

/// MACD line relative to its signal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdBias {
    Bullish,
    Bearish,
}

/// Price location relative to the Bollinger bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandPosition {
    AboveUpper,
    BelowLower,
    Inside,
}

impl BandPosition {
    pub fn from_position(position: f64) -> Self {
        if position > 1.0 {
            Self::AboveUpper
        } else if position < 0.0 {
            Self::BelowLower
        } else {
            Self::Inside
        }
    }
}

/// Coarse confidence bucket used for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceBand {
    High,
    Moderate,
    Low,
    Weak,
}

impl ConfidenceBand {
    /// Bucket a confidence in [0, 1].
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.8 {
            Self::High
        } else if confidence >= 0.6 {
            Self::Moderate
        } else if confidence >= 0.4 {
            Self::Low
        } else {
            Self::Weak
        }
    }
}

/// Format a confidence in [0, 1] as a whole percentage, e.g. `0.83` -> `"83%"`.
pub fn format_confidence(confidence: f64) -> String {
    // Ties round up, e.g. 0.125 -> "13%"
    format!("{:.0}%", (confidence * 100.0).round())
}

/// Parse an RFC 3339 timestamp, treating one without an offset as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(time) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(time.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S%.f"))
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {:?}: {}", raw, e)))
}

/// A point-in-time signal for one instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Buy/Sell/Hold. Sent as `signal` by the service.
    #[serde(rename = "signal", alias = "classification")]
    pub classification: Classification,
    /// Confidence in [0, 1].
    pub confidence: f64,
    /// Last observed price.
    pub price: f64,
    #[serde(default)]
    pub indicators: Indicators,
}

impl Signal {
    /// Check the invariants a fetched signal must hold.
    pub fn validate(&self) -> Result<(), String> {
        if !self.confidence.is_finite() || !(0.0..=1.0).contains(&self.confidence) {
            return Err(format!(
                "confidence {} outside [0, 1] for {}",
                self.confidence, self.symbol
            ));
        }
        if !self.price.is_finite() {
            return Err(format!("non-finite price for {}", self.symbol));
        }
        Ok(())
    }

    pub fn confidence_band(&self) -> ConfidenceBand {
        ConfidenceBand::from_confidence(self.confidence)
    }

    pub fn confidence_label(&self) -> String {
        format_confidence(self.confidence)
    }
}

/// Signal history for one symbol, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalHistory {
    #[serde(default)]
    pub signals: Vec<Signal>,
}

impl SignalHistory {
    pub fn new(signals: Vec<Signal>) -> Self {
        Self { signals }
    }

    /// Validate each signal and the newest-first ordering.
    pub fn validate(&self) -> Result<(), String> {
        for signal in &self.signals {
            signal.validate()?;
        }
        for pair in self.signals.windows(2) {
            if pair[0].timestamp < pair[1].timestamp {
                return Err(format!(
                    "history out of order: {} listed before {}",
                    pair[0].timestamp, pair[1].timestamp
                ));
            }
        }
        Ok(())
    }

    /// The `limit` most recent signals, newest first.
    pub fn recent(&self, limit: usize) -> &[Signal] {
        &self.signals[..limit.min(self.signals.len())]
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Iterate oldest first.
    pub fn chronological(&self) -> impl Iterator<Item = &Signal> {
        self.signals.iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal_json(signal: &str, confidence: f64) -> String {
        format!(
            r#"{{
                "symbol": "BTCUSDT",
                "timestamp": "2024-03-01T12:00:00Z",
                "signal": "{}",
                "confidence": {},
                "price": 61234.5,
                "indicators": {{
                    "rsi": 72.1, "macd": 12.5, "macd_signal": 10.0,
                    "bb_position": 0.8, "sma_20": 60000.0, "sma_50": 58000.0,
                    "price": 61234.5
                }}
            }}"#,
            signal, confidence
        )
    }

    #[test]
    fn test_signal_deserialization() {
        let signal: Signal = serde_json::from_str(&signal_json("Sell", 0.91)).unwrap();
        assert_eq!(signal.symbol, "BTCUSDT");
        assert_eq!(signal.classification, Classification::Sell);
        assert_eq!(signal.confidence, 0.91);
        assert_eq!(signal.indicators.macd_signal, 10.0);
        assert!(signal.validate().is_ok());
    }

    #[test]
    fn test_classification_alias_and_case() {
        let json = r#"{"symbol":"ETHUSDT","timestamp":"2024-03-01T12:00:00Z",
            "classification":"buy","confidence":0.5,"price":3000.0}"#;
        let signal: Signal = serde_json::from_str(json).unwrap();
        assert_eq!(signal.classification, Classification::Buy);
        assert_eq!(signal.indicators, Indicators::default());
    }

    #[test]
    fn test_unknown_classification_rejected() {
        assert!(serde_json::from_str::<Signal>(&signal_json("Moon", 0.5)).is_err());
    }

    #[test]
    fn test_confidence_out_of_range_is_invalid() {
        let signal: Signal = serde_json::from_str(&signal_json("Buy", 1.2)).unwrap();
        assert!(signal.validate().is_err());

        let signal: Signal = serde_json::from_str(&signal_json("Buy", -0.01)).unwrap();
        assert!(signal.validate().is_err());

        let signal: Signal = serde_json::from_str(&signal_json("Buy", 1.0)).unwrap();
        assert!(signal.validate().is_ok());
    }

    #[test]
    fn test_format_confidence() {
        assert_eq!(format_confidence(0.83), "83%");
        assert_eq!(format_confidence(0.91), "91%");
        assert_eq!(format_confidence(0.0), "0%");
        assert_eq!(format_confidence(1.0), "100%");
        assert_eq!(format_confidence(0.125), "13%");
        assert_eq!(format_confidence(0.625), "63%");
    }

    #[test]
    fn test_timestamp_without_offset_is_utc() {
        let json = r#"{"symbol":"BTCUSDT","timestamp":"2024-03-01T12:00:00.123456",
            "signal":"Buy","confidence":0.5,"price":61000.0}"#;
        let signal: Signal = serde_json::from_str(json).unwrap();
        assert_eq!(signal.timestamp.to_rfc3339(), "2024-03-01T12:00:00.123456+00:00");

        let json = r#"{"symbol":"BTCUSDT","timestamp":"2024-03-01T14:00:00+02:00",
            "signal":"Buy","confidence":0.5,"price":61000.0}"#;
        let signal: Signal = serde_json::from_str(json).unwrap();
        assert_eq!(signal.timestamp.to_rfc3339(), "2024-03-01T12:00:00+00:00");

        let json = r#"{"symbol":"BTCUSDT","timestamp":"yesterday",
            "signal":"Buy","confidence":0.5,"price":61000.0}"#;
        assert!(serde_json::from_str::<Signal>(json).is_err());
    }

    #[test]
    fn test_confidence_bands() {
        assert_eq!(ConfidenceBand::from_confidence(0.85), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_confidence(0.6), ConfidenceBand::Moderate);
        assert_eq!(ConfidenceBand::from_confidence(0.45), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::from_confidence(0.1), ConfidenceBand::Weak);
    }

    #[test]
    fn test_indicator_readings() {
        let indicators = Indicators {
            rsi: 75.0,
            macd: 1.0,
            macd_signal: 2.0,
            bb_position: -0.2,
            ..Default::default()
        };
        assert_eq!(indicators.rsi_zone(), RsiZone::Overbought);
        assert_eq!(indicators.macd_bias(), MacdBias::Bearish);
        assert_eq!(indicators.band_position(), BandPosition::BelowLower);
        assert_eq!(RsiZone::from_rsi(25.0), RsiZone::Oversold);
        assert_eq!(RsiZone::from_rsi(50.0), RsiZone::Neutral);
    }

    #[test]
    fn test_history_missing_array_defaults_to_empty() {
        let history: SignalHistory = serde_json::from_str("{}").unwrap();
        assert!(history.is_empty());
    }

    #[test]
    fn test_history_ordering_validation() {
        let newer: Signal = serde_json::from_str(&signal_json("Buy", 0.5)).unwrap();
        let mut older = newer.clone();
        older.timestamp = newer.timestamp - chrono::Duration::minutes(5);

        let ok = SignalHistory::new(vec![newer.clone(), older.clone()]);
        assert!(ok.validate().is_ok());

        let reversed = SignalHistory::new(vec![older, newer]);
        assert!(reversed.validate().is_err());
    }

    #[test]
    fn test_recent_keeps_newest() {
        let newer: Signal = serde_json::from_str(&signal_json("Buy", 0.5)).unwrap();
        let mut older = newer.clone();
        older.timestamp = newer.timestamp - chrono::Duration::minutes(5);
        let history = SignalHistory::new(vec![newer.clone(), older]);

        assert_eq!(history.recent(1), &[newer][..]);
        assert_eq!(history.recent(10).len(), 2);
        assert!(SignalHistory::default().recent(10).is_empty());
    }
}
