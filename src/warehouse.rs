// =============================================================================
// Warehouse export — trailing-window slice + JSON row upload
// =============================================================================
//
// The upload window is a pure function of the series and the clock: a fixed
// trailing 7-day window ending at a fixed daily cutoff time, with the single
// most recent record excluded because its time bucket may still receive late
// updates. The transport is a thin JSON-rows-over-HTTP client; the
// destination is addressed as `{endpoint}/{dataset}/{table}`.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::trigger::ScheduledTime;
use crate::types::CandleSeries;

/// Length of the upload window.
const WINDOW_DAYS: i64 = 7;

/// Slice `series` to the trailing upload window as of `now`.
///
/// `cutoff` is the daily cutoff wall-clock time (UTC): the window ends at
/// today's `{cutoff.hour}:{cutoff.minute}:59` and starts 7 days and 1 minute
/// earlier, both bounds inclusive. The most recent record inside the window
/// is dropped. Assumes `series` is sorted (store invariant).
pub fn export_window(
    series: &CandleSeries,
    now: DateTime<Utc>,
    cutoff: ScheduledTime,
) -> CandleSeries {
    let cutoff_end = now
        .date_naive()
        .and_hms_opt(cutoff.hour, cutoff.minute, 59)
        .map(|dt| dt.and_utc())
        .unwrap_or(now);
    let cutoff_start = cutoff_end - Duration::days(WINDOW_DAYS) - Duration::minutes(1);

    let mut selected: Vec<_> = series
        .candles
        .iter()
        .filter(|c| c.timestamp >= cutoff_start && c.timestamp <= cutoff_end)
        .cloned()
        .collect();

    // The newest bucket may still receive late updates; never upload it.
    selected.pop();

    CandleSeries::new(selected)
}

pub struct WarehouseClient {
    endpoint: String,
    client: reqwest::Client,
}

impl WarehouseClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client");

        Self {
            endpoint: endpoint.into(),
            client,
        }
    }

    /// Upload a pre-sliced, deduplicated, sorted series as JSON rows.
    ///
    /// An empty slice is a no-op, not an error.
    pub async fn upload(&self, slice: &CandleSeries, dataset: &str, table: &str) -> Result<()> {
        if slice.is_empty() {
            debug!(dataset, table, "no rows in upload window — skipping");
            return Ok(());
        }

        let url = format!("{}/{}/{}", self.endpoint.trim_end_matches('/'), dataset, table);

        let resp = self
            .client
            .post(&url)
            .json(&slice.candles)
            .send()
            .await
            .map_err(|e| PipelineError::UploadFailure(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::UploadFailure(format!(
                "warehouse returned HTTP {status}"
            )));
        }

        info!(dataset, table, rows = slice.len(), "warehouse upload complete");
        Ok(())
    }
}
