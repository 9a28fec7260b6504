// =============================================================================
// Candela — OHLCV signal pipeline, main entry point
// =============================================================================
//
// One run is a short, bounded batch job: for each configured pair, fetch raw
// candles, merge them into the persisted series, prune to the retention
// window, compute indicators, and — when the wall-clock trigger fires — push
// a signal message. Pairs are processed sequentially with no shared mutable
// state; a failing pair is skipped, the run continues.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod config;
mod cross;
mod error;
mod fetch;
mod indicators;
mod notify;
mod resample;
mod signal;
mod store;
mod trigger;
mod types;
mod warehouse;

use chrono::{Duration, Utc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{AppConfig, Secrets};
use crate::cross::detect_crosses;
use crate::error::Result;
use crate::fetch::{quote_currency, CryptoCompareClient};
use crate::indicators::engine::{IndicatorEngine, KEY_MACD, KEY_MACD_SIGNAL};
use crate::notify::LineNotifier;
use crate::signal::format_signal;
use crate::store::TimeSeriesStore;
use crate::trigger::should_fire;
use crate::types::{RetentionWindow, SeriesKey};
use crate::warehouse::{export_window, WarehouseClient};

const DEFAULT_CONFIG_PATH: &str = "config/config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Candela signal pipeline starting");

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    // A missing file falls back to defaults; an unparsable one is fatal.
    let config = if std::path::Path::new(&config_path).exists() {
        AppConfig::load(&config_path)?
    } else {
        warn!(path = %config_path, "config file not found — using defaults");
        AppConfig::default()
    };

    // Abort on a broken configuration before any I/O happens.
    config.validate()?;

    let secrets = Secrets::from_env();
    let fetcher = CryptoCompareClient::new(secrets.crypto_api_key.clone());
    let notifier = LineNotifier::new(
        secrets.line_channel_token.clone(),
        secrets.line_user_id.clone(),
    );
    let store = TimeSeriesStore::new(&config.storage.path);

    let warehouse_endpoint = std::env::var("WAREHOUSE_ENDPOINT")
        .unwrap_or_else(|_| config.warehouse.endpoint.clone());
    let warehouse_client = WarehouseClient::new(warehouse_endpoint);

    info!(
        pairs = ?config.data.pairs,
        exchange = %config.data.exchange,
        rolling_days = config.storage.rolling_days,
        "run configured"
    );

    // ── 2. Per-pair cycle, sequential ────────────────────────────────────
    for pair in &config.data.pairs {
        if let Err(e) = process_pair(pair, &config, &fetcher, &notifier, &warehouse_client, &store)
            .await
        {
            warn!(pair = %pair, error = %e, "pair cycle failed — continuing with next pair");
        }
    }

    info!("run complete");
    Ok(())
}

/// Full cycle for a single (exchange, pair) key.
async fn process_pair(
    pair: &str,
    config: &AppConfig,
    fetcher: &CryptoCompareClient,
    notifier: &LineNotifier,
    warehouse_client: &WarehouseClient,
    store: &TimeSeriesStore,
) -> Result<()> {
    let key = SeriesKey::new(config.data.exchange.clone(), pair);

    // ── Fetch & persist ──────────────────────────────────────────────────
    let incoming = fetcher
        .fetch_ohlcv(pair, &config.data.exchange, config.data.interval, config.data.limit)
        .await?;

    let existing = store.load_or_empty(&key);
    let merged = TimeSeriesStore::merge(&existing, &incoming);

    let window = RetentionWindow::new(Utc::now(), config.storage.rolling_days);
    let pruned = TimeSeriesStore::prune(&merged, &window);
    store.persist(&pruned, &key)?;

    info!(
        key = %key,
        fetched = incoming.len(),
        merged = merged.len(),
        retained = pruned.len(),
        "series updated"
    );

    // ── Analyse ──────────────────────────────────────────────────────────
    // The analysis input is the full merged series, so indicator warm-up may
    // use history that retention just dropped from disk.
    let mut analysis = merged;
    if let Some(minutes) = config.analysis.resample_minutes {
        analysis = resample::resample(&analysis, Duration::minutes(minutes))?;
    }
    if let Some(lookback) = config.analysis.lookback {
        analysis = analysis.tail(lookback);
    }

    let annotated = IndicatorEngine::compute(&analysis, &config.analysis.indicators);

    if config.analysis.indicators.macd {
        let timestamps = analysis.timestamps();
        let macd: Vec<_> = annotated.iter().map(|a| a.value(KEY_MACD)).collect();
        let sig: Vec<_> = annotated.iter().map(|a| a.value(KEY_MACD_SIGNAL)).collect();
        if let Some(event) = detect_crosses(&timestamps, &macd, &sig).last() {
            info!(
                key = %key,
                direction = %event.direction,
                at = %event.timestamp,
                "most recent MACD cross"
            );
        }
    }

    // ── Notify ───────────────────────────────────────────────────────────
    if config.notify.enabled {
        let tz = config.notify.tz()?;
        let now_local = Utc::now().with_timezone(&tz);

        if !should_fire(&now_local, &config.notify.trigger_times) {
            info!(key = %key, now = %now_local.format("%H:%M"), "trigger not fired");
        } else if let [.., previous, latest] = annotated.as_slice() {
            let message = format_signal(latest, previous, quote_currency(pair));
            // Notification and storage are not transactional: a failed push
            // is logged and the persisted series stays as written.
            if let Err(e) = notifier.push(&message, None).await {
                error!(key = %key, error = %e, "notification failed");
            }
        } else {
            warn!(key = %key, "not enough annotated candles to build a signal");
        }
    }

    // ── Warehouse export ─────────────────────────────────────────────────
    if config.warehouse.enabled {
        let slice = export_window(&pruned, Utc::now(), config.warehouse.cutoff);
        let table = pair.replace('-', "_");
        if let Err(e) = warehouse_client
            .upload(&slice, &config.warehouse.dataset, &table)
            .await
        {
            error!(key = %key, error = %e, "warehouse upload failed");
        }
    }

    Ok(())
}
