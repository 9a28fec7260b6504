// =============================================================================
// Moving Average Convergence / Divergence (MACD)
// =============================================================================
//
//   macd      = EMA(fast) - EMA(slow)          (defined where both are)
//   signal    = EMA(signal_period) over the defined macd values
//   histogram = macd - signal
//
// Cross flags are computed per index from consecutive samples:
//   cross_up   : macd moves from <= signal to > signal
//   cross_down : macd moves from >= signal to < signal
// Both are false whenever any of the four compared values is undefined, and
// an equal-to-equal step is not a crossing.

use super::ema::ema_series;

/// Aligned MACD output; every vector has the same length as the input closes.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd: Vec<Option<f64>>,
    pub signal: Vec<Option<f64>>,
    pub histogram: Vec<Option<f64>>,
    pub cross_up: Vec<bool>,
    pub cross_down: Vec<bool>,
}

/// Compute MACD(fast, slow, signal_period) over `closes`.
///
/// With the standard (12, 26, 9) parameters the macd line is defined from
/// index 25 and the signal / histogram from index 33.
pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal_period: usize) -> MacdSeries {
    let n = closes.len();
    let ema_fast = ema_series(closes, fast);
    let ema_slow = ema_series(closes, slow);

    let mut macd: Vec<Option<f64>> = vec![None; n];
    for i in 0..n {
        if let (Some(f), Some(s)) = (ema_fast[i], ema_slow[i]) {
            macd[i] = Some(f - s);
        }
    }

    // The signal line is an EMA over the *defined* macd values only; scatter
    // the compact result back onto the original indices.
    let defined: Vec<(usize, f64)> = macd
        .iter()
        .enumerate()
        .filter_map(|(i, v)| v.map(|x| (i, x)))
        .collect();
    let compact: Vec<f64> = defined.iter().map(|&(_, v)| v).collect();
    let signal_compact = ema_series(&compact, signal_period);

    let mut signal: Vec<Option<f64>> = vec![None; n];
    for (&(orig_idx, _), sig) in defined.iter().zip(signal_compact.iter()) {
        signal[orig_idx] = *sig;
    }

    let mut histogram: Vec<Option<f64>> = vec![None; n];
    for i in 0..n {
        if let (Some(m), Some(s)) = (macd[i], signal[i]) {
            histogram[i] = Some(m - s);
        }
    }

    let mut cross_up = vec![false; n];
    let mut cross_down = vec![false; n];
    for i in 1..n {
        if let (Some(m_prev), Some(s_prev), Some(m), Some(s)) =
            (macd[i - 1], signal[i - 1], macd[i], signal[i])
        {
            cross_up[i] = m_prev <= s_prev && m > s;
            cross_down[i] = m_prev >= s_prev && m < s;
        }
    }

    MacdSeries {
        macd,
        signal,
        histogram,
        cross_up,
        cross_down,
    }
}
