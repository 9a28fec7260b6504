// =============================================================================
// Exponential Moving Average (EMA)
// =============================================================================
//
// EMA gives more weight to recent prices, making it more responsive to new
// information than the Simple Moving Average (SMA).
//
// Formula:
//   multiplier = 2 / (period + 1)
//   EMA_t      = close_t * multiplier + EMA_{t-1} * (1 - multiplier)
//
// The very first EMA value is seeded with the SMA of the first `period`
// closes. The output is aligned to the input: index i of the result annotates
// index i of the input, with `None` during the warm-up prefix.

/// Compute the EMA series for the given `closes` slice and look-back `period`.
///
/// Returns a vector of the same length as `closes`; elements at indices
/// `< period - 1` are `None` (insufficient history), the element at
/// `period - 1` is the SMA seed, and later elements follow the recursion.
///
/// # Edge cases
/// - `period == 0` => all `None` (division by zero guard)
/// - `closes.len() < period` => all `None`
/// - A non-finite intermediate value stops the series; the remainder is `None`.
pub fn ema_series(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 || closes.len() < period {
        return result;
    }

    let multiplier = 2.0 / (period as f64 + 1.0);

    // Seed: SMA of the first `period` values, placed at index period - 1.
    let sma: f64 = closes[..period].iter().sum::<f64>() / period as f64;
    if !sma.is_finite() {
        return result;
    }
    result[period - 1] = Some(sma);

    let mut prev = sma;
    for (i, &close) in closes.iter().enumerate().skip(period) {
        let ema = close * multiplier + prev * (1.0 - multiplier);
        if !ema.is_finite() {
            // Downstream consumers should not trust a broken series.
            break;
        }
        result[i] = Some(ema);
        prev = ema;
    }

    result
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ema_empty_input() {
        assert!(ema_series(&[], 5).is_empty());
    }

    #[test]
    fn ema_period_zero() {
        assert_eq!(ema_series(&[1.0, 2.0, 3.0], 0), vec![None, None, None]);
    }

    #[test]
    fn ema_insufficient_data() {
        assert_eq!(ema_series(&[1.0, 2.0], 5), vec![None, None]);
    }

    #[test]
    fn ema_seed_is_sma_at_period_minus_one() {
        let closes = vec![2.0, 4.0, 6.0];
        let ema = ema_series(&closes, 3);
        assert_eq!(ema.len(), 3);
        assert_eq!(ema[0], None);
        assert_eq!(ema[1], None);
        assert!((ema[2].unwrap() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn ema_warmup_boundary_period_12() {
        // Undefined for the first 11 indices, defined from index 11 onward.
        let closes: Vec<f64> = (1..=30).map(|x| x as f64).collect();
        let ema = ema_series(&closes, 12);
        for v in &ema[..11] {
            assert!(v.is_none());
        }
        for v in &ema[11..] {
            assert!(v.is_some());
        }
    }

    #[test]
    fn ema_known_values() {
        // 5-period EMA of [1..10]: SMA seed 3.0 at index 4, multiplier 1/3.
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let ema = ema_series(&closes, 5);

        let mult = 2.0 / 6.0;
        let mut expected = 3.0;
        assert!((ema[4].unwrap() - expected).abs() < 1e-10);
        for (i, &c) in closes.iter().enumerate().skip(5) {
            expected = c * mult + expected * (1.0 - mult);
            let got = ema[i].unwrap();
            assert!((got - expected).abs() < 1e-10, "got {got}, expected {expected}");
        }
    }

    #[test]
    fn ema_handles_nan_in_input() {
        let closes = vec![1.0, 2.0, 3.0, f64::NAN, 5.0];
        let ema = ema_series(&closes, 3);
        // Seed at index 2, then NaN at index 3 stops the series.
        assert!(ema[2].is_some());
        assert!(ema[3].is_none());
        assert!(ema[4].is_none());
    }
}
