// =============================================================================
// TriggerScheduler — exact-minute notification gate
// =============================================================================
//
// A pure function of wall-clock time and configuration: the trigger fires iff
// the current (hour, minute) in the configured timezone exactly matches one
// of the scheduled times.
//
// LIMITATION: there is no tolerance window. A run launched even one minute
// early or late silently skips its notification. This matches the source
// behaviour and is intentional — widening it is a product decision, not a
// bug fix.

use chrono::{DateTime, TimeZone, Timelike};
use serde::{Deserialize, Serialize};

/// One scheduled wall-clock firing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledTime {
    pub hour: u32,
    pub minute: u32,
}

impl ScheduledTime {
    pub fn new(hour: u32, minute: u32) -> Self {
        Self { hour, minute }
    }
}

/// True iff `now`'s (hour, minute) matches one of `scheduled` exactly.
pub fn should_fire<Tz: TimeZone>(now: &DateTime<Tz>, scheduled: &[ScheduledTime]) -> bool {
    scheduled
        .iter()
        .any(|t| t.hour == now.hour() && t.minute == now.minute())
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use chrono_tz::Asia::Tokyo;

    fn schedule() -> Vec<ScheduledTime> {
        vec![ScheduledTime::new(9, 0), ScheduledTime::new(18, 0)]
    }

    #[test]
    fn fires_on_exact_match() {
        let now = Tokyo.with_ymd_and_hms(2024, 3, 1, 9, 0, 42).unwrap();
        assert!(should_fire(&now, &schedule()));
    }

    #[test]
    fn one_minute_late_misses() {
        let now = Tokyo.with_ymd_and_hms(2024, 3, 1, 9, 1, 0).unwrap();
        assert!(!should_fire(&now, &schedule()));
    }

    #[test]
    fn one_minute_early_misses() {
        let now = Tokyo.with_ymd_and_hms(2024, 3, 1, 17, 59, 59).unwrap();
        assert!(!should_fire(&now, &schedule()));
    }

    #[test]
    fn timezone_drives_the_match() {
        // 00:00 UTC is 09:00 in Tokyo.
        let utc_midnight = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        assert!(!should_fire(&utc_midnight, &schedule()));
        assert!(should_fire(&utc_midnight.with_timezone(&Tokyo), &schedule()));
    }

    #[test]
    fn empty_schedule_never_fires() {
        let now = Tokyo.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        assert!(!should_fire(&now, &[]));
    }
}
