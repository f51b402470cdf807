//! Financial Modeling Prep client for daily index bars.
//!
//! Only the historical price endpoint is used:
//! `GET {base}/historical-price-full/{symbol}?from=YYYY-MM-DD&to=YYYY-MM-DD&apikey=...`
//!
//! Responses are cached per (symbol, from, to) for `cache_ttl`, and requests
//! are spaced by at least `min_request_interval`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::types::DailyBar;

/// FMP v3 API base URL.
pub const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com/api/v3";

/// FMP API errors.
#[derive(Error, Debug)]
pub enum FmpError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("No data available for {symbol} between {from} and {to}")]
    NoData {
        symbol: String,
        from: NaiveDate,
        to: NaiveDate,
    },
}

/// Client settings.
#[derive(Debug, Clone)]
pub struct FmpConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub min_request_interval: Duration,
    pub cache_ttl: Duration,
}

impl FmpConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            min_request_interval: Duration::from_millis(250),
            cache_ttl: Duration::from_secs(3600),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

/// Raw historical bar as returned by FMP.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHistoricalBar {
    pub date: String,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    #[serde(default)]
    pub close: Option<f64>,
    #[serde(default)]
    pub volume: Option<f64>,
    #[serde(default)]
    pub change_percent: Option<f64>,
}

impl RawHistoricalBar {
    /// Convert to a typed bar. Returns `None` for unparseable dates or
    /// missing/unrepresentable prices.
    pub fn to_bar(&self) -> Option<DailyBar> {
        Some(DailyBar {
            date: NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?,
            open: Decimal::try_from(self.open?).ok()?,
            high: Decimal::try_from(self.high?).ok()?,
            low: Decimal::try_from(self.low?).ok()?,
            close: Decimal::try_from(self.close?).ok()?,
            volume: self.volume.unwrap_or(0.0) as i64,
        })
    }
}

#[derive(Debug, Deserialize)]
struct HistoricalResponse {
    #[serde(default)]
    historical: Option<Vec<RawHistoricalBar>>,
    #[serde(default, rename = "Error Message")]
    error_message: Option<String>,
}

/// Parse a historical-price-full body into bars sorted by date.
pub fn parse_historical(
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
    body: &str,
) -> Result<Vec<DailyBar>, FmpError> {
    let response: HistoricalResponse = serde_json::from_str(body)
        .map_err(|e| FmpError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

    if let Some(message) = response.error_message {
        return Err(FmpError::Api(message));
    }

    let raw = response.historical.unwrap_or_default();
    let total = raw.len();
    let mut bars: Vec<DailyBar> = raw.iter().filter_map(RawHistoricalBar::to_bar).collect();

    if bars.len() < total {
        warn!(symbol, skipped = total - bars.len(), "Dropped unparseable bars");
    }
    if bars.is_empty() {
        return Err(FmpError::NoData {
            symbol: symbol.to_string(),
            from,
            to,
        });
    }

    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    symbol: String,
    from: NaiveDate,
    to: NaiveDate,
}

#[derive(Debug, Clone)]
struct CachedBars {
    fetched_at: Instant,
    bars: Vec<DailyBar>,
}

/// FMP API client.
pub struct FmpClient {
    client: Client,
    config: FmpConfig,
    last_request: Instant,
    request_count: u64,
    cache: HashMap<CacheKey, CachedBars>,
}

impl FmpClient {
    /// Create a new client.
    pub fn new(config: FmpConfig) -> Result<Self, FmpError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        let now = Instant::now();
        Ok(Self {
            client,
            last_request: now.checked_sub(config.min_request_interval).unwrap_or(now),
            config,
            request_count: 0,
            cache: HashMap::new(),
        })
    }

    /// Get request count for monitoring.
    pub fn request_count(&self) -> u64 {
        self.request_count
    }

    fn endpoint_url(&self, symbol: &str) -> String {
        format!(
            "{}/historical-price-full/{}",
            self.config.base_url.trim_end_matches('/'),
            symbol
        )
    }

    fn cached(&self, key: &CacheKey) -> Option<&[DailyBar]> {
        self.cache
            .get(key)
            .filter(|entry| entry.fetched_at.elapsed() < self.config.cache_ttl)
            .map(|entry| entry.bars.as_slice())
    }

    /// Drop every cached response.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Daily bars for `symbol` in `[from, to]`, ascending by date.
    pub async fn historical_bars(
        &mut self,
        symbol: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyBar>, FmpError> {
        let key = CacheKey {
            symbol: symbol.to_string(),
            from,
            to,
        };
        if let Some(bars) = self.cached(&key) {
            debug!(symbol, %from, %to, "Cache hit");
            return Ok(bars.to_vec());
        }

        let elapsed = self.last_request.elapsed();
        if elapsed < self.config.min_request_interval {
            tokio::time::sleep(self.config.min_request_interval - elapsed).await;
        }

        let from_str = from.format("%Y-%m-%d").to_string();
        let to_str = to.format("%Y-%m-%d").to_string();
        let params = [
            ("from", from_str.as_str()),
            ("to", to_str.as_str()),
            ("apikey", self.config.api_key.as_str()),
        ];

        debug!(symbol, %from, %to, "Requesting historical bars");
        let response = self
            .client
            .get(self.endpoint_url(symbol))
            .query(&params)
            .send()
            .await?;

        self.last_request = Instant::now();
        self.request_count += 1;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FmpError::RateLimitExceeded);
        }

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(FmpError::Api(format!("{}: {}", status, text)));
        }

        let body = response.text().await?;
        let bars = parse_historical(symbol, from, to, &body)?;

        self.cache.insert(
            key,
            CachedBars {
                fetched_at: Instant::now(),
                bars: bars.clone(),
            },
        );
        Ok(bars)
    }
}
