// =============================================================================
// SignalFormatter — render the latest annotated candle as a push message
// =============================================================================
//
// The cross label compares the previous and latest MACD/signal ordering with
// the same strict-transition rule the cross detector uses, restricted to the
// single most recent step: `GC` (golden cross) on an upward crossing, `DC`
// (dead cross) on a downward one, `-` otherwise. Any undefined indicator
// renders as `-`; formatting never fails.

use crate::indicators::engine::{KEY_MACD, KEY_MACD_SIGNAL, KEY_RSI};
use crate::types::AnnotatedCandle;

const PLACEHOLDER: &str = "-";

/// Build the human-readable signal message for the two most recent annotated
/// candles. `quote_currency` is the second leg of the pair (e.g. `JPY`).
pub fn format_signal(
    latest: &AnnotatedCandle,
    previous: &AnnotatedCandle,
    quote_currency: &str,
) -> String {
    let price = group_thousands(latest.candle.close);
    let rsi = fmt_value(latest.value(KEY_RSI));
    let macd = fmt_value(latest.value(KEY_MACD));
    let signal = fmt_value(latest.value(KEY_MACD_SIGNAL));
    let cross = cross_label(latest, previous);

    format!(
        "\u{1F4C8} Signal Update\n\
         Price: {price} {quote_currency}\n\
         RSI: {rsi}\n\
         MACD: {macd}\n\
         Signal: {signal}\n\
         Cross: {cross}"
    )
}

/// `GC` / `DC` / `-` for the single most recent MACD-vs-signal step.
fn cross_label(latest: &AnnotatedCandle, previous: &AnnotatedCandle) -> &'static str {
    let (Some(m_prev), Some(s_prev), Some(m), Some(s)) = (
        previous.value(KEY_MACD),
        previous.value(KEY_MACD_SIGNAL),
        latest.value(KEY_MACD),
        latest.value(KEY_MACD_SIGNAL),
    ) else {
        return PLACEHOLDER;
    };

    if m_prev <= s_prev && m > s {
        "GC"
    } else if m_prev >= s_prev && m < s {
        "DC"
    } else {
        PLACEHOLDER
    }
}

fn fmt_value(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.2}"),
        None => PLACEHOLDER.to_string(),
    }
}

/// Format a price rounded to whole units with `,` thousands separators.
fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{grouped}")
    } else {
        grouped
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Candle;
    use chrono::{TimeZone, Utc};

    fn annotated(close: f64, macd: Option<f64>, signal: Option<f64>, rsi: Option<f64>) -> AnnotatedCandle {
        let mut a = AnnotatedCandle::new(Candle {
            timestamp: Utc.timestamp_opt(0, 0).unwrap(),
            open: close,
            high: close,
            low: close,
            close,
            volume_from: 0.0,
            volume_to: 0.0,
        });
        if let Some(v) = macd {
            a.set(KEY_MACD, v);
        }
        if let Some(v) = signal {
            a.set(KEY_MACD_SIGNAL, v);
        }
        if let Some(v) = rsi {
            a.set(KEY_RSI, v);
        }
        a
    }

    #[test]
    fn renders_all_lines() {
        let prev = annotated(100.0, Some(-0.5), Some(-0.2), Some(40.0));
        let latest = annotated(6_543_210.0, Some(0.3), Some(-0.2), Some(62.5));

        let msg = format_signal(&latest, &prev, "JPY");
        assert!(msg.contains("Price: 6,543,210 JPY"));
        assert!(msg.contains("RSI: 62.50"));
        assert!(msg.contains("MACD: 0.30"));
        assert!(msg.contains("Signal: -0.20"));
        assert!(msg.contains("Cross: GC"));
    }

    #[test]
    fn golden_and_dead_cross_are_distinct() {
        let below = annotated(1.0, Some(-1.0), Some(0.0), None);
        let above = annotated(1.0, Some(1.0), Some(0.0), None);

        let up = format_signal(&above, &below, "JPY");
        assert!(up.contains("Cross: GC"));

        let down = format_signal(&below, &above, "JPY");
        assert!(down.contains("Cross: DC"));
    }

    #[test]
    fn no_cross_when_ordering_unchanged() {
        let a = annotated(1.0, Some(1.0), Some(0.0), None);
        let b = annotated(1.0, Some(2.0), Some(0.0), None);
        let msg = format_signal(&b, &a, "JPY");
        assert!(msg.contains("Cross: -"));
    }

    #[test]
    fn undefined_indicators_fall_back_to_placeholder() {
        let prev = annotated(1.0, None, None, None);
        let latest = annotated(1_000.0, None, None, None);

        let msg = format_signal(&latest, &prev, "JPY");
        assert!(msg.contains("Price: 1,000 JPY"));
        assert!(msg.contains("RSI: -"));
        assert!(msg.contains("MACD: -"));
        assert!(msg.contains("Signal: -"));
        assert!(msg.contains("Cross: -"));
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(0.0), "0");
        assert_eq!(group_thousands(999.0), "999");
        assert_eq!(group_thousands(1_000.0), "1,000");
        assert_eq!(group_thousands(123_456_789.4), "123,456,789");
        assert_eq!(group_thousands(-9_876.0), "-9,876");
    }
}
