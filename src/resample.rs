// =============================================================================
// Resampler — OHLCV aggregation into coarser fixed-width intervals
// =============================================================================
//
// Buckets are aligned to the Unix epoch so that re-running over the same data
// always yields identical bucket boundaries. Aggregation per non-empty bucket:
//
//   open   = first candle's open (by time order)
//   high   = max of highs
//   low    = min of lows
//   close  = last candle's close
//   volume = sum (both volume_from and volume_to)
//
// Empty buckets are dropped, never interpolated, so the output may carry gaps
// when the input is sparse. The input must already be sorted ascending — a
// store invariant.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::error::{PipelineError, Result};
use crate::types::{Candle, CandleSeries};

/// Aggregate `series` into epoch-aligned buckets of width `interval`.
///
/// Fails with `InvalidInterval` when `interval` is zero or negative.
pub fn resample(series: &CandleSeries, interval: Duration) -> Result<CandleSeries> {
    let interval_secs = interval.num_seconds();
    if interval_secs <= 0 {
        return Err(PipelineError::InvalidInterval(format!(
            "interval must be positive, got {interval_secs}s"
        )));
    }

    // BTreeMap keeps buckets in chronological order for free.
    let mut buckets: BTreeMap<i64, Candle> = BTreeMap::new();

    for c in &series.candles {
        let bucket_start = c.timestamp.timestamp().div_euclid(interval_secs) * interval_secs;

        match buckets.get_mut(&bucket_start) {
            Some(agg) => {
                agg.high = agg.high.max(c.high);
                agg.low = agg.low.min(c.low);
                agg.close = c.close;
                agg.volume_from += c.volume_from;
                agg.volume_to += c.volume_to;
            }
            None => {
                buckets.insert(
                    bucket_start,
                    Candle {
                        timestamp: bucket_timestamp(bucket_start),
                        open: c.open,
                        high: c.high,
                        low: c.low,
                        close: c.close,
                        volume_from: c.volume_from,
                        volume_to: c.volume_to,
                    },
                );
            }
        }
    }

    Ok(CandleSeries::new(buckets.into_values().collect()))
}

fn bucket_timestamp(secs: i64) -> DateTime<Utc> {
    // Valid for any i64 in the supported chrono range; bucket starts come from
    // existing candle timestamps, so this never fires in practice.
    Utc.timestamp_opt(secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
