//! Projects a newest-first signal history into chronological chart series.

use crate::types::{ChartSeries, ConfidencePoint, MacdPoint, PricePoint, SignalHistory};

/// Build the price/RSI, MACD and confidence series, oldest first.
pub fn project(history: &SignalHistory) -> ChartSeries {
    let mut series = ChartSeries::default();

    for signal in history.chronological() {
        let indicators = &signal.indicators;

        series.price.push(PricePoint {
            time: signal.timestamp,
            price: signal.price,
            rsi: indicators.rsi,
        });
        series.macd.push(MacdPoint {
            time: signal.timestamp,
            macd: indicators.macd,
            signal_line: indicators.macd_signal,
            histogram: indicators.macd - indicators.macd_signal,
        });
        series.confidence.push(ConfidencePoint {
            time: signal.timestamp,
            confidence_percent: signal.confidence * 100.0,
            classification: signal.classification,
        });
    }

    series
}

/// Convert values to `(x, y)` pairs with x as the point index.
pub fn to_xy<T>(points: &[T], value: impl Fn(&T) -> f64) -> Vec<(f64, f64)> {
    points
        .iter()
        .enumerate()
        .map(|(i, p)| (i as f64, value(p)))
        .collect()
}

/// Min and max of a set of values, padded so a flat line is still drawable.
pub fn bounds(values: impl IntoIterator<Item = f64>) -> Option<[f64; 2]> {
    let (min, max) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        })?;

    let pad = ((max - min) * 0.05).max(max.abs() * 0.001).max(1e-9);
    Some([min - pad, max + pad])
}
