// =============================================================================
// IndicatorEngine — annotate a candle series with the requested indicators
// =============================================================================
//
// The engine is deterministic and stateless: every run recomputes the full
// warm-up history from the candle sequence alone. Only requested indicators
// are emitted; an indicator that lacks history at some index is simply absent
// from that candle's value map.

use serde::{Deserialize, Serialize};

use super::bollinger::bollinger_series;
use super::ema::ema_series;
use super::macd::macd_series;
use super::rsi::rsi_series;
use crate::types::{AnnotatedCandle, CandleSeries};

pub const EMA_FAST_PERIOD: usize = 12;
pub const EMA_SLOW_PERIOD: usize = 26;
pub const MACD_SIGNAL_PERIOD: usize = 9;
pub const RSI_PERIOD: usize = 14;
pub const BB_PERIOD: usize = 20;
pub const BB_NUM_STD: f64 = 2.0;

// Value-map keys for AnnotatedCandle.
pub const KEY_EMA_FAST: &str = "ema_12";
pub const KEY_EMA_SLOW: &str = "ema_26";
pub const KEY_RSI: &str = "rsi_14";
pub const KEY_MACD: &str = "macd";
pub const KEY_MACD_SIGNAL: &str = "macd_signal";
pub const KEY_MACD_HISTOGRAM: &str = "macd_histogram";
pub const KEY_BB_UPPER: &str = "bb_upper";
pub const KEY_BB_MIDDLE: &str = "bb_middle";
pub const KEY_BB_LOWER: &str = "bb_lower";

fn default_true() -> bool {
    true
}

/// Closed capability set of indicators the engine can compute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndicatorToggles {
    #[serde(default = "default_true")]
    pub ema: bool,
    #[serde(default = "default_true")]
    pub rsi: bool,
    #[serde(default = "default_true")]
    pub macd: bool,
    #[serde(default = "default_true")]
    pub bb: bool,
}

impl Default for IndicatorToggles {
    fn default() -> Self {
        Self {
            ema: true,
            rsi: true,
            macd: true,
            bb: true,
        }
    }
}

pub struct IndicatorEngine;

impl IndicatorEngine {
    /// Compute the requested indicators over `series` and return one annotated
    /// candle per input candle.
    pub fn compute(series: &CandleSeries, toggles: &IndicatorToggles) -> Vec<AnnotatedCandle> {
        let closes = series.closes();
        let mut annotated: Vec<AnnotatedCandle> = series
            .candles
            .iter()
            .cloned()
            .map(AnnotatedCandle::new)
            .collect();

        if toggles.ema {
            let fast = ema_series(&closes, EMA_FAST_PERIOD);
            let slow = ema_series(&closes, EMA_SLOW_PERIOD);
            for (i, a) in annotated.iter_mut().enumerate() {
                if let Some(v) = fast[i] {
                    a.set(KEY_EMA_FAST, v);
                }
                if let Some(v) = slow[i] {
                    a.set(KEY_EMA_SLOW, v);
                }
            }
        }

        if toggles.rsi {
            let rsi = rsi_series(&closes, RSI_PERIOD);
            for (i, a) in annotated.iter_mut().enumerate() {
                if let Some(v) = rsi[i] {
                    a.set(KEY_RSI, v);
                }
            }
        }

        if toggles.macd {
            let macd = macd_series(&closes, EMA_FAST_PERIOD, EMA_SLOW_PERIOD, MACD_SIGNAL_PERIOD);
            for (i, a) in annotated.iter_mut().enumerate() {
                if let Some(v) = macd.macd[i] {
                    a.set(KEY_MACD, v);
                }
                if let Some(v) = macd.signal[i] {
                    a.set(KEY_MACD_SIGNAL, v);
                }
                if let Some(v) = macd.histogram[i] {
                    a.set(KEY_MACD_HISTOGRAM, v);
                }
                a.macd_cross_up = macd.cross_up[i];
                a.macd_cross_down = macd.cross_down[i];
            }
        }

        if toggles.bb {
            let bands = bollinger_series(&closes, BB_PERIOD, BB_NUM_STD);
            for (i, a) in annotated.iter_mut().enumerate() {
                if let Some(p) = bands[i] {
                    a.set(KEY_BB_UPPER, p.upper);
                    a.set(KEY_BB_MIDDLE, p.middle);
                    a.set(KEY_BB_LOWER, p.lower);
                }
            }
        }

        annotated
    }
}
