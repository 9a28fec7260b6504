// =============================================================================
// Shared types used across the Candela signal pipeline
// =============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A single OHLCV candle.
///
/// `timestamp` is the sole identity key within a series: when two candles for
/// the same key carry the same timestamp, the one merged later wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume_from: f64,
    pub volume_to: f64,
}

/// Composite key that identifies one persisted candle series.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct SeriesKey {
    pub exchange: String,
    pub pair: String,
}

impl SeriesKey {
    pub fn new(exchange: impl Into<String>, pair: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            pair: pair.into(),
        }
    }

    /// File name of the persisted series: `{exchange}_{pair}` with the pair's
    /// `-` separator replaced by `_`, e.g. `bitflyer_BTC_JPY.csv`.
    pub fn file_name(&self) -> String {
        format!("{}_{}.csv", self.exchange, self.pair.replace('-', "_"))
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.pair, self.exchange)
    }
}

/// An ordered candle sequence, unique and ascending by timestamp after any
/// store operation. Consumers never mutate a series in place; indicator
/// computation produces a parallel annotated sequence instead.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CandleSeries {
    pub candles: Vec<Candle>,
}

impl CandleSeries {
    pub fn new(candles: Vec<Candle>) -> Self {
        Self { candles }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Close prices in series order.
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Timestamps in series order.
    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.candles.iter().map(|c| c.timestamp).collect()
    }

    /// The last `n` candles (the whole series when shorter).
    pub fn tail(&self, n: usize) -> CandleSeries {
        let start = self.candles.len().saturating_sub(n);
        CandleSeries::new(self.candles[start..].to_vec())
    }
}

/// A candle extended with computed indicator values.
///
/// A key absent from `values` means the indicator is undefined at this index
/// (warm-up). The MACD cross flags are false whenever any of the values they
/// compare is undefined.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedCandle {
    pub candle: Candle,
    pub values: BTreeMap<String, f64>,
    pub macd_cross_up: bool,
    pub macd_cross_down: bool,
}

impl AnnotatedCandle {
    pub fn new(candle: Candle) -> Self {
        Self {
            candle,
            values: BTreeMap::new(),
            macd_cross_up: false,
            macd_cross_down: false,
        }
    }

    pub fn value(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn set(&mut self, name: &str, value: f64) {
        self.values.insert(name.to_string(), value);
    }
}

/// Direction of a crossing between a fast and a slow series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "UP"),
            Self::Down => write!(f, "DOWN"),
        }
    }
}

/// A sign change between two series at consecutive samples. Derived and
/// ephemeral; recomputed on every run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrossEvent {
    pub timestamp: DateTime<Utc>,
    pub direction: Direction,
}

/// Trailing span of persisted history to keep. Candles strictly older than
/// `cutoff()` are dropped from storage (not from the in-memory analysis
/// input).
#[derive(Debug, Clone, Copy)]
pub struct RetentionWindow {
    pub now: DateTime<Utc>,
    pub rolling_days: i64,
}

impl RetentionWindow {
    pub fn new(now: DateTime<Utc>, rolling_days: i64) -> Self {
        Self { now, rolling_days }
    }

    pub fn cutoff(&self) -> DateTime<Utc> {
        self.now - Duration::days(self.rolling_days)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn candle(secs: i64, close: f64) -> Candle {
        Candle {
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume_from: 1.0,
            volume_to: 2.0,
        }
    }

    #[test]
    fn key_file_name_replaces_pair_separator() {
        let key = SeriesKey::new("bitflyer", "BTC-JPY");
        assert_eq!(key.file_name(), "bitflyer_BTC_JPY.csv");
        assert_eq!(key.to_string(), "BTC-JPY@bitflyer");
    }

    #[test]
    fn series_tail_shorter_than_request() {
        let series = CandleSeries::new(vec![candle(0, 1.0), candle(60, 2.0)]);
        assert_eq!(series.tail(10).len(), 2);
        assert_eq!(series.tail(1).candles[0].close, 2.0);
        assert_eq!(series.tail(0).len(), 0);
    }

    #[test]
    fn retention_cutoff_subtracts_days() {
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
        let window = RetentionWindow::new(now, 30);
        assert_eq!(
            window.cutoff(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn annotated_candle_value_roundtrip() {
        let mut a = AnnotatedCandle::new(candle(0, 100.0));
        assert_eq!(a.value("rsi_14"), None);
        a.set("rsi_14", 55.5);
        assert_eq!(a.value("rsi_14"), Some(55.5));
        assert!(!a.macd_cross_up);
        assert!(!a.macd_cross_down);
    }
}
