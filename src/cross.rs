// =============================================================================
// CrossDetector — directional crossings between two optional series
// =============================================================================
//
// Generalisation of the MACD cross flags: given a fast and a slow series with
// possibly-undefined entries, emit an event at every index where the fast
// series strictly crosses the slow one between consecutive samples.
//
// Rules (all four values must be defined, otherwise no event):
//   UP   : fast[i-1] <= slow[i-1]  and  fast[i] > slow[i]
//   DOWN : fast[i-1] >= slow[i-1]  and  fast[i] < slow[i]
// An equal-to-equal pair is not a crossing.

use chrono::{DateTime, Utc};

use crate::types::{CrossEvent, Direction};

/// Detect crossings of `fast` over `slow`. `timestamps` supplies the event
/// time per index; all three slices must have equal length.
pub fn detect_crosses(
    timestamps: &[DateTime<Utc>],
    fast: &[Option<f64>],
    slow: &[Option<f64>],
) -> Vec<CrossEvent> {
    debug_assert_eq!(timestamps.len(), fast.len());
    debug_assert_eq!(fast.len(), slow.len());

    let mut events = Vec::new();
    for i in 1..fast.len().min(slow.len()).min(timestamps.len()) {
        let (Some(f_prev), Some(s_prev), Some(f), Some(s)) =
            (fast[i - 1], slow[i - 1], fast[i], slow[i])
        else {
            continue;
        };

        if f_prev <= s_prev && f > s {
            events.push(CrossEvent {
                timestamp: timestamps[i],
                direction: Direction::Up,
            });
        } else if f_prev >= s_prev && f < s {
            events.push(CrossEvent {
                timestamp: timestamps[i],
                direction: Direction::Down,
            });
        }
    }

    events
}
