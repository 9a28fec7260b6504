// =============================================================================
// TimeSeriesStore — incremental candle persistence (CSV, one file per key)
// =============================================================================
//
// Storage contract:
//
// - `merge`  : concat + dedup-by-timestamp (incoming wins) + sort ascending.
//              Idempotent: merge(merge(A, B), B) == merge(A, B).
// - `prune`  : pure retention filter; the persisted copy is overwritten with
//              the pruned result so deleted history never regrows.
// - `persist`: full replace-on-write via tmp + rename, so a crash mid-write
//              cannot leave a half-written file visible to the next load.
// - `load`   : always returns a sorted, deduplicated series; a corrupt file
//              surfaces as `StorageUnavailable` and is NOT deleted.
//
// Callers must serialize access to the same key; no locking is provided.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{PipelineError, Result};
use crate::types::{Candle, CandleSeries, RetentionWindow, SeriesKey};

/// Persisted column order. Derived indicator columns exist only in memory and
/// are never written here.
const CSV_HEADER: [&str; 7] = [
    "timestamp",
    "open",
    "high",
    "low",
    "close",
    "volume_to",
    "volume_from",
];

pub struct TimeSeriesStore {
    base_path: PathBuf,
}

impl TimeSeriesStore {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn path_for(&self, key: &SeriesKey) -> PathBuf {
        self.base_path.join(key.file_name())
    }

    // -------------------------------------------------------------------------
    // Load
    // -------------------------------------------------------------------------

    /// Load the persisted series for `key`.
    ///
    /// Returns an empty series when no file exists yet. Returns
    /// `StorageUnavailable` when the file exists but cannot be read or parsed;
    /// the file itself is left in place so a later successful persist can
    /// replace it.
    pub fn load(&self, key: &SeriesKey) -> Result<CandleSeries> {
        let path = self.path_for(key);
        if !path.exists() {
            debug!(key = %key, "no persisted series yet");
            return Ok(CandleSeries::default());
        }

        let mut reader = csv::Reader::from_path(&path)
            .map_err(|e| storage_err(&path, format!("open failed: {e}")))?;

        let mut candles = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| storage_err(&path, format!("read failed: {e}")))?;
            candles.push(parse_row(&record).map_err(|reason| storage_err(&path, reason))?);
        }

        // Loaded rows go through merge so callers never observe unsorted or
        // duplicate data, even if the file was edited by hand.
        let series = Self::merge(&CandleSeries::default(), &CandleSeries::new(candles));
        debug!(key = %key, rows = series.len(), "series loaded");
        Ok(series)
    }

    /// Pipeline-facing wrapper: a corrupt or unreadable file degrades to an
    /// empty series with a warning instead of aborting the run. A fresh fetch
    /// then repopulates it on the next persist.
    pub fn load_or_empty(&self, key: &SeriesKey) -> CandleSeries {
        match self.load(key) {
            Ok(series) => series,
            Err(e) => {
                warn!(key = %key, error = %e, "treating unreadable series as empty");
                CandleSeries::default()
            }
        }
    }

    // -------------------------------------------------------------------------
    // Merge / prune (pure)
    // -------------------------------------------------------------------------

    /// Merge `incoming` into `existing`: duplicates by timestamp resolve to
    /// the incoming value, output is ascending by timestamp.
    pub fn merge(existing: &CandleSeries, incoming: &CandleSeries) -> CandleSeries {
        let mut by_ts: BTreeMap<DateTime<Utc>, Candle> = BTreeMap::new();
        for c in &existing.candles {
            by_ts.insert(c.timestamp, c.clone());
        }
        for c in &incoming.candles {
            by_ts.insert(c.timestamp, c.clone());
        }
        CandleSeries::new(by_ts.into_values().collect())
    }

    /// Keep only candles with `timestamp >= window.cutoff()`.
    pub fn prune(series: &CandleSeries, window: &RetentionWindow) -> CandleSeries {
        let cutoff = window.cutoff();
        CandleSeries::new(
            series
                .candles
                .iter()
                .filter(|c| c.timestamp >= cutoff)
                .cloned()
                .collect(),
        )
    }

    // -------------------------------------------------------------------------
    // Persist
    // -------------------------------------------------------------------------

    /// Write the full series atomically (tmp sibling + rename).
    pub fn persist(&self, series: &CandleSeries, key: &SeriesKey) -> Result<()> {
        let path = self.path_for(key);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| storage_err(&path, format!("create dir failed: {e}")))?;
        }

        let tmp_path = path.with_extension("csv.tmp");

        let mut writer = csv::Writer::from_path(&tmp_path)
            .map_err(|e| storage_err(&tmp_path, format!("open tmp failed: {e}")))?;

        writer
            .write_record(CSV_HEADER)
            .map_err(|e| storage_err(&tmp_path, format!("write header failed: {e}")))?;

        for c in &series.candles {
            writer
                .write_record([
                    c.timestamp.to_rfc3339(),
                    c.open.to_string(),
                    c.high.to_string(),
                    c.low.to_string(),
                    c.close.to_string(),
                    c.volume_to.to_string(),
                    c.volume_from.to_string(),
                ])
                .map_err(|e| storage_err(&tmp_path, format!("write row failed: {e}")))?;
        }

        writer
            .flush()
            .map_err(|e| storage_err(&tmp_path, format!("flush failed: {e}")))?;
        drop(writer);

        std::fs::rename(&tmp_path, &path)
            .map_err(|e| storage_err(&path, format!("rename failed: {e}")))?;

        info!(key = %key, rows = series.len(), "series persisted (atomic)");
        Ok(())
    }
}

fn storage_err(path: &Path, reason: String) -> PipelineError {
    PipelineError::StorageUnavailable {
        path: path.display().to_string(),
        reason,
    }
}

fn parse_row(record: &csv::StringRecord) -> std::result::Result<Candle, String> {
    let field = |i: usize| -> std::result::Result<&str, String> {
        record.get(i).ok_or_else(|| format!("missing column {i}"))
    };
    let num = |i: usize| -> std::result::Result<f64, String> {
        field(i)?
            .parse::<f64>()
            .map_err(|e| format!("bad number in column {i}: {e}"))
    };

    let timestamp = field(0)?
        .parse::<DateTime<Utc>>()
        .map_err(|e| format!("bad timestamp: {e}"))?;

    Ok(Candle {
        timestamp,
        open: num(1)?,
        high: num(2)?,
        low: num(3)?,
        close: num(4)?,
        volume_to: num(5)?,
        volume_from: num(6)?,
    })
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
            open: close - 0.5,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume_from: 1.5,
            volume_to: 3.0,
        }
    }

    fn series(specs: &[(i64, f64)]) -> CandleSeries {
        CandleSeries::new(specs.iter().map(|&(t, c)| candle(t, c)).collect())
    }

    // ---- merge -----------------------------------------------------------

    #[test]
    fn merge_sorts_and_dedups_keeping_incoming() {
        let existing = series(&[(120, 10.0), (0, 1.0)]);
        let incoming = series(&[(60, 5.0), (120, 99.0)]);

        let merged = TimeSeriesStore::merge(&existing, &incoming);
        let ts: Vec<i64> = merged.candles.iter().map(|c| c.timestamp.timestamp()).collect();
        assert_eq!(ts, vec![0, 60, 120]);
        // Conflict at t=120 resolves to the incoming close.
        assert_eq!(merged.candles[2].close, 99.0);
    }

    #[test]
    fn merge_is_idempotent() {
        let a = series(&[(0, 1.0), (60, 2.0), (180, 4.0)]);
        let b = series(&[(60, 2.5), (120, 3.0)]);

        let once = TimeSeriesStore::merge(&a, &b);
        let twice = TimeSeriesStore::merge(&once, &b);
        assert_eq!(once, twice);
    }

    #[test]
    fn merge_with_empty_sides() {
        let a = series(&[(0, 1.0)]);
        let empty = CandleSeries::default();
        assert_eq!(TimeSeriesStore::merge(&a, &empty), a);
        assert_eq!(TimeSeriesStore::merge(&empty, &a), a);
        assert!(TimeSeriesStore::merge(&empty, &empty).is_empty());
    }

    // ---- prune -----------------------------------------------------------

    #[test]
    fn prune_keeps_exactly_the_window() {
        let now = Utc.timestamp_opt(86_400 * 10, 0).unwrap();
        let window = RetentionWindow::new(now, 5);
        let cutoff_secs = 86_400 * 5;

        let s = series(&[
            (cutoff_secs - 1, 1.0), // just outside — dropped
            (cutoff_secs, 2.0),     // exactly on the cutoff — kept
            (cutoff_secs + 1, 3.0),
        ]);

        let pruned = TimeSeriesStore::prune(&s, &window);
        assert_eq!(pruned.len(), 2);
        assert!(pruned
            .candles
            .iter()
            .all(|c| c.timestamp >= window.cutoff()));
        assert_eq!(pruned.candles[0].close, 2.0);
    }

    #[test]
    fn prune_is_pure() {
        let s = series(&[(0, 1.0), (86_400 * 9, 2.0)]);
        let window = RetentionWindow::new(Utc.timestamp_opt(86_400 * 10, 0).unwrap(), 5);
        let before = s.clone();
        let _ = TimeSeriesStore::prune(&s, &window);
        assert_eq!(s, before);
    }

    // ---- persist / load --------------------------------------------------

    #[test]
    fn persist_load_roundtrip_sorted_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimeSeriesStore::new(dir.path());
        let key = SeriesKey::new("bitflyer", "BTC-JPY");

        // Unsorted with a duplicate timestamp on purpose.
        let s = series(&[(120, 3.0), (0, 1.0), (120, 4.0), (60, 2.0)]);
        let normalised = TimeSeriesStore::merge(&CandleSeries::default(), &s);
        store.persist(&normalised, &key).unwrap();

        let loaded = store.load(&key).unwrap();
        let ts: Vec<i64> = loaded.candles.iter().map(|c| c.timestamp.timestamp()).collect();
        assert_eq!(ts, vec![0, 60, 120]);
        assert_eq!(loaded, normalised);
    }

    #[test]
    fn persist_replaces_not_appends() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimeSeriesStore::new(dir.path());
        let key = SeriesKey::new("bitflyer", "ETH-JPY");

        store.persist(&series(&[(0, 1.0), (60, 2.0)]), &key).unwrap();
        store.persist(&series(&[(60, 2.0)]), &key).unwrap();

        let loaded = store.load(&key).unwrap();
        assert_eq!(loaded.len(), 1);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimeSeriesStore::new(dir.path());
        let key = SeriesKey::new("bitflyer", "XRP-JPY");
        assert!(store.load(&key).unwrap().is_empty());
    }

    #[test]
    fn corrupt_file_degrades_to_empty_without_deleting() {
        let dir = tempfile::tempdir().unwrap();
        let store = TimeSeriesStore::new(dir.path());
        let key = SeriesKey::new("bitflyer", "BTC-JPY");

        let path = dir.path().join(key.file_name());
        std::fs::write(&path, "timestamp,open\nnot-a-date,zzz\n").unwrap();

        assert!(store.load(&key).is_err());
        assert!(store.load_or_empty(&key).is_empty());
        // The corrupt file is still there until the next successful persist.
        assert!(path.exists());

        store.persist(&series(&[(0, 1.0)]), &key).unwrap();
        assert_eq!(store.load(&key).unwrap().len(), 1);
    }
}
