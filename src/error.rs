// =============================================================================
// Pipeline error taxonomy
// =============================================================================
//
// Each variant maps to a distinct recovery posture in main.rs:
//
// - `FetchFailure`         => skip the current pair, continue the run
// - `StorageUnavailable`   => treat as an empty series; the on-disk file is
//                             left untouched until the next successful persist
// - `InvalidInterval` /
//   `InvalidConfiguration` => fatal, abort before any I/O
// - `NotificationFailure` /
//   `UploadFailure`        => logged only; storage writes are not rolled back
//
// Indicator computation has no error variant by construction: insufficient
// history propagates as an absent value, never as an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("market data fetch failed: {0}")]
    FetchFailure(String),

    #[error("storage unavailable at {path}: {reason}")]
    StorageUnavailable { path: String, reason: String },

    #[error("invalid resample interval: {0}")]
    InvalidInterval(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("notification delivery failed: {0}")]
    NotificationFailure(String),

    #[error("warehouse upload failed: {0}")]
    UploadFailure(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
