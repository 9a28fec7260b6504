// =============================================================================
// CryptoCompare REST client — raw OHLCV candle fetch
// =============================================================================
//
// External collaborator at the pipeline's ingest boundary. A failure here is
// fatal for the current pair's cycle only: main.rs logs it and moves on to
// the next pair. No internal retry.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{PipelineError, Result};
use crate::types::{Candle, CandleSeries};

const BASE_URL: &str = "https://min-api.cryptocompare.com/data/v2";

/// Candle granularity offered by the provider's history endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchInterval {
    #[default]
    #[serde(rename = "1min")]
    Minute,
    #[serde(rename = "1hour")]
    Hour,
    #[serde(rename = "1day")]
    Day,
}

impl FetchInterval {
    fn endpoint(&self) -> &'static str {
        match self {
            Self::Minute => "histominute",
            Self::Hour => "histohour",
            Self::Day => "histoday",
        }
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct HistoryResponse {
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Message", default)]
    message: String,
    #[serde(rename = "Data", default)]
    data: Option<HistoryData>,
}

#[derive(Debug, Default, Deserialize)]
struct HistoryData {
    #[serde(rename = "Data", default)]
    data: Vec<RawCandle>,
}

#[derive(Debug, Deserialize)]
struct RawCandle {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    volumefrom: f64,
    volumeto: f64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct CryptoCompareClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl CryptoCompareClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            api_key: api_key.into(),
            base_url: BASE_URL.to_string(),
            client,
        }
    }

    #[cfg(test)]
    fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let mut c = Self::new(api_key);
        c.base_url = base_url.into();
        c
    }

    /// Fetch up to `limit` candles for `pair` (e.g. `BTC-JPY`) on `exchange`.
    ///
    /// The returned series carries whatever order the provider sent; the store
    /// normalises it on merge.
    pub async fn fetch_ohlcv(
        &self,
        pair: &str,
        exchange: &str,
        interval: FetchInterval,
        limit: u32,
    ) -> Result<CandleSeries> {
        let (fsym, tsym) = split_pair(pair)?;
        let url = format!("{}/{}", self.base_url, interval.endpoint());

        debug!(pair = %pair, exchange = %exchange, ?interval, limit, "fetching candles");

        let limit_param = limit.to_string();
        let resp = self
            .client
            .get(&url)
            .query(&[
                ("fsym", fsym),
                ("tsym", tsym),
                ("e", exchange),
                ("limit", limit_param.as_str()),
                ("api_key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| PipelineError::FetchFailure(format!("request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PipelineError::FetchFailure(format!(
                "provider returned HTTP {status}"
            )));
        }

        let body: HistoryResponse = resp
            .json()
            .await
            .map_err(|e| PipelineError::FetchFailure(format!("bad response body: {e}")))?;

        if body.response.eq_ignore_ascii_case("error") {
            return Err(PipelineError::FetchFailure(format!(
                "provider error: {}",
                body.message
            )));
        }

        let raw = body
            .data
            .ok_or_else(|| PipelineError::FetchFailure("response missing Data".into()))?
            .data;

        let candles: Vec<Candle> = raw.iter().map(convert).collect();
        info!(pair = %pair, rows = candles.len(), "candles fetched");
        Ok(CandleSeries::new(candles))
    }
}

fn convert(raw: &RawCandle) -> Candle {
    Candle {
        timestamp: to_utc(raw.time),
        open: raw.open,
        high: raw.high,
        low: raw.low,
        close: raw.close,
        volume_from: raw.volumefrom,
        volume_to: raw.volumeto,
    }
}

fn to_utc(unix_secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(unix_secs, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn split_pair(pair: &str) -> Result<(&str, &str)> {
    match pair.split_once('-') {
        Some((base, quote)) if !base.is_empty() && !quote.is_empty() => Ok((base, quote)),
        _ => Err(PipelineError::InvalidConfiguration(format!(
            "pair must look like BASE-QUOTE, got {pair:?}"
        ))),
    }
}

/// The quote leg of a pair, used when rendering prices. Falls back to the
/// whole pair string when the separator is missing.
pub fn quote_currency(pair: &str) -> &str {
    pair.split_once('-').map_or(pair, |(_, quote)| quote)
}
