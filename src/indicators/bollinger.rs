// =============================================================================
// Bollinger Bands
// =============================================================================
//
// Bollinger Bands consist of a middle band (rolling mean), an upper band
// (mean + k*σ), and a lower band (mean - k*σ), where σ is the population
// standard deviation of the closes inside the window.
//
// The output is aligned to the input; values are defined from index `period`
// onward, each computed over the trailing `period` samples ending at that
// index.

/// One point of a Bollinger Band series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Compute Bollinger Bands over `closes` with the given window `period` and
/// band width `num_std` (in standard deviations).
///
/// Returns a vector of the same length as `closes`; elements at indices
/// `< period` are `None`.
///
/// # Edge cases
/// - `period == 0` => all `None`
/// - Non-finite band values are dropped (that index stays `None`).
/// - A flat window yields upper == middle == lower.
pub fn bollinger_series(closes: &[f64], period: usize, num_std: f64) -> Vec<Option<BollingerPoint>> {
    let mut result = vec![None; closes.len()];
    if period == 0 {
        return result;
    }

    for i in period..closes.len() {
        let window = &closes[i + 1 - period..=i];

        let middle: f64 = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|x| (x - middle).powi(2)).sum::<f64>() / period as f64;
        let std_dev = variance.sqrt();

        let upper = middle + num_std * std_dev;
        let lower = middle - num_std * std_dev;

        if upper.is_finite() && middle.is_finite() && lower.is_finite() {
            result[i] = Some(BollingerPoint {
                upper,
                middle,
                lower,
            });
        }
    }

    result
}
