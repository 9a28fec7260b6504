// =============================================================================
// AppConfig — pipeline settings with serde defaults and pre-I/O validation
// =============================================================================
//
// Every field carries `#[serde(default)]` so that a partial config file never
// breaks loading. Credentials are NOT part of this file — they come from the
// environment (see `Secrets`) so tokens never end up in version control.
//
// `validate()` must run before any I/O: a broken configuration aborts the run
// with `InvalidConfiguration` before a single byte is fetched or written.

use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::fetch::FetchInterval;
use crate::indicators::engine::IndicatorToggles;
use crate::trigger::ScheduledTime;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_pairs() -> Vec<String> {
    vec!["BTC-JPY".to_string()]
}

fn default_exchange() -> String {
    "bitflyer".to_string()
}

fn default_limit() -> u32 {
    2000
}

fn default_storage_path() -> String {
    "data/raw".to_string()
}

fn default_rolling_days() -> i64 {
    30
}

fn default_timezone() -> String {
    "Asia/Tokyo".to_string()
}

fn default_trigger_times() -> Vec<ScheduledTime> {
    vec![ScheduledTime::new(9, 0), ScheduledTime::new(18, 0)]
}

fn default_warehouse_cutoff() -> ScheduledTime {
    ScheduledTime::new(9, 20)
}

// =============================================================================
// Sections
// =============================================================================

/// What to fetch and under which key to persist it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_pairs")]
    pub pairs: Vec<String>,
    #[serde(default = "default_exchange")]
    pub exchange: String,
    #[serde(default)]
    pub interval: FetchInterval,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            pairs: default_pairs(),
            exchange: default_exchange(),
            interval: FetchInterval::default(),
            limit: default_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_path")]
    pub path: String,
    #[serde(default = "default_rolling_days")]
    pub rolling_days: i64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
            rolling_days: default_rolling_days(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub indicators: IndicatorToggles,
    /// Optional coarser interval to resample to, in minutes.
    #[serde(default)]
    pub resample_minutes: Option<i64>,
    /// Optional cap on how many trailing candles feed the analysis.
    #[serde(default)]
    pub lookback: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_trigger_times")]
    pub trigger_times: Vec<ScheduledTime>,
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            trigger_times: default_trigger_times(),
            timezone: default_timezone(),
        }
    }
}

impl NotifyConfig {
    /// Parse the configured timezone name.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone.parse::<Tz>().map_err(|_| {
            PipelineError::InvalidConfiguration(format!("unknown timezone: {}", self.timezone))
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub dataset: String,
    /// Daily cutoff time (UTC) ending the trailing 7-day upload window.
    #[serde(default = "default_warehouse_cutoff")]
    pub cutoff: ScheduledTime,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: String::new(),
            dataset: String::new(),
            cutoff: default_warehouse_cutoff(),
        }
    }
}

// =============================================================================
// AppConfig
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub warehouse: WarehouseConfig,
}

impl AppConfig {
    /// Load configuration from a JSON file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::InvalidConfiguration(format!(
                "failed to read config from {}: {e}",
                path.display()
            ))
        })?;

        let config: Self = serde_json::from_str(&content).map_err(|e| {
            PipelineError::InvalidConfiguration(format!(
                "failed to parse config from {}: {e}",
                path.display()
            ))
        })?;

        info!(
            path = %path.display(),
            pairs = ?config.data.pairs,
            exchange = %config.data.exchange,
            "config loaded"
        );

        Ok(config)
    }

    /// Reject configurations that could silently corrupt the pipeline.
    /// Runs before any I/O.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(PipelineError::InvalidConfiguration(msg));

        if self.data.pairs.is_empty() {
            return invalid("no pairs configured".into());
        }
        for pair in &self.data.pairs {
            if pair.split('-').count() != 2 || pair.split('-').any(str::is_empty) {
                return invalid(format!("pair must look like BASE-QUOTE, got {pair:?}"));
            }
        }
        if self.data.limit == 0 {
            return invalid("fetch limit must be positive".into());
        }
        if self.storage.rolling_days <= 0 {
            return invalid(format!(
                "rolling_days must be positive, got {}",
                self.storage.rolling_days
            ));
        }
        if let Some(minutes) = self.analysis.resample_minutes {
            if minutes <= 0 {
                return invalid(format!("resample_minutes must be positive, got {minutes}"));
            }
        }
        self.notify.tz()?;
        for t in self
            .notify
            .trigger_times
            .iter()
            .chain(std::iter::once(&self.warehouse.cutoff))
        {
            if t.hour > 23 || t.minute > 59 {
                return invalid(format!("invalid wall-clock time {}:{:02}", t.hour, t.minute));
            }
        }
        if self.warehouse.enabled && self.warehouse.endpoint.is_empty() {
            return invalid("warehouse enabled but no endpoint configured".into());
        }

        Ok(())
    }
}

// =============================================================================
// Secrets
// =============================================================================

/// Credentials taken from the environment (usually via a `.env` file).
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub crypto_api_key: String,
    pub line_channel_token: String,
    pub line_user_id: String,
}

impl Secrets {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).unwrap_or_default();
        Self {
            crypto_api_key: var("CRYPTOCOMPARE_API_KEY"),
            line_channel_token: var("LINE_CHANNEL_TOKEN"),
            line_user_id: var("LINE_USER_ID"),
        }
    }
}
