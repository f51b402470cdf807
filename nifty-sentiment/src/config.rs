//! Application configuration.
//!
//! Loaded from TOML. Every section and field is optional and falls back to
//! the defaults below. The provider API key is never read from the file; it
//! comes from `FMP_API_KEY` (a `.env` file is honoured by the binary).

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calendar::{CalendarConfig, TradingCalendar, MAX_LOOKBACK_DAYS};
use crate::data::fmp::DEFAULT_BASE_URL;
use crate::data::{FmpConfig, SymbolSet};
use crate::engine::{EngineError, GapThresholds, MovementConfig, MovementPredictor};

/// Environment variable holding the provider API key.
pub const API_KEY_ENV: &str = "FMP_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("{0} environment variable is not set")]
    MissingApiKey(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl From<EngineError> for ConfigError {
    fn from(err: EngineError) -> Self {
        ConfigError::Invalid(err.to_string())
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub symbols: SymbolSet,
    pub calendar: CalendarConfig,
    pub provider: ProviderConfig,
}

/// Engine thresholds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub gap: GapThresholds,
    pub movement: MovementConfig,
}

/// Quote provider settings (everything except the key).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub min_request_interval_ms: u64,
    /// How long fetched bars are reused.
    pub cache_ttl_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            min_request_interval_ms: 250,
            cache_ttl_secs: 3600,
        }
    }
}

impl AppConfig {
    /// Load and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.gap.validate()?;
        self.engine.movement.validate()?;

        if !(0..=MAX_LOOKBACK_DAYS).contains(&self.calendar.lookback_days) {
            return Err(ConfigError::Invalid(format!(
                "calendar.lookback_days must be within 0..={}, got {}",
                MAX_LOOKBACK_DAYS, self.calendar.lookback_days
            )));
        }

        for (name, symbol) in [
            ("pre_market_proxy", &self.symbols.pre_market_proxy),
            ("benchmark", &self.symbols.benchmark),
            ("correlated", &self.symbols.correlated),
        ] {
            if symbol.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("symbols.{} is empty", name)));
            }
        }

        if self.provider.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("provider.base_url is empty".to_string()));
        }
        Ok(())
    }

    pub fn predictor(&self) -> Result<MovementPredictor, ConfigError> {
        Ok(MovementPredictor::new(self.engine.gap, self.engine.movement)?)
    }

    pub fn trading_calendar(&self) -> TradingCalendar {
        TradingCalendar::new(self.calendar.clone())
    }

    pub fn fmp_config(&self, api_key: String) -> FmpConfig {
        FmpConfig {
            api_key,
            base_url: self.provider.base_url.clone(),
            timeout: Duration::from_secs(self.provider.timeout_secs),
            min_request_interval: Duration::from_millis(self.provider.min_request_interval_ms),
            cache_ttl: Duration::from_secs(self.provider.cache_ttl_secs),
        }
    }
}

/// Read the provider key from the environment.
pub fn api_key_from_env() -> Result<String, ConfigError> {
    resolve_api_key(std::env::var(API_KEY_ENV).ok())
}

fn resolve_api_key(value: Option<String>) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingApiKey(API_KEY_ENV))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_defaults_are_canonical() {
        let config = AppConfig::default();
        assert_eq!(config.engine.gap.flat_band, 40.0);
        assert_eq!(config.engine.gap.huge_gap, 100.0);
        assert_eq!(config.engine.movement.band_multiplier, 2.0);
        assert_eq!(config.calendar.lookback_days, 10);
        assert_eq!(config.provider.cache_ttl_secs, 3600);
        assert!(config.validate().is_ok());
        assert_eq!(config.predictor().unwrap(), MovementPredictor::default());
    }

    #[test]
    fn test_partial_toml_merges_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [engine.gap]
            flat_band = 25.0

            [symbols]
            correlated = "^IXIC"

            [calendar]
            holidays = ["2024-05-01", "2024-05-20"]
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.gap.flat_band, 25.0);
        assert_eq!(config.engine.gap.huge_gap, 100.0);
        assert_eq!(config.symbols.correlated, "^IXIC");
        assert_eq!(config.symbols.benchmark, "^NSEI");
        assert_eq!(config.calendar.lookback_days, 10);

        let cal = config.trading_calendar();
        assert!(cal.is_holiday(NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()));
    }

    #[test]
    fn test_empty_toml_is_default() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let err = AppConfig::from_toml_str(
            r#"
            [engine.gap]
            flat_band = 120.0
            huge_gap = 100.0
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_lookback_out_of_range_rejected() {
        for value in ["-1", "3651", "1000000000000"] {
            let err = AppConfig::from_toml_str(&format!("[calendar]\nlookback_days = {}\n", value)).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid(ref msg) if msg.contains("lookback_days")),
                "lookback_days = {}",
                value
            );
        }
        let config = AppConfig::from_toml_str("[calendar]\nlookback_days = 3650\n").unwrap();
        assert_eq!(config.calendar.lookback_days, MAX_LOOKBACK_DAYS);
    }

    #[test]
    fn test_empty_symbol_rejected() {
        let err = AppConfig::from_toml_str("[symbols]\nbenchmark = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("benchmark")));
    }

    #[test]
    fn test_parse_error() {
        let err = AppConfig::from_toml_str("[engine.gap\nflat_band = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_fmp_config() {
        let config = AppConfig::default();
        let fmp = config.fmp_config("secret".to_string());
        assert_eq!(fmp.api_key, "secret");
        assert_eq!(fmp.base_url, DEFAULT_BASE_URL);
        assert_eq!(fmp.cache_ttl, Duration::from_secs(3600));
        assert_eq!(fmp.min_request_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_resolve_api_key() {
        assert_eq!(resolve_api_key(Some(" abc ".to_string())).unwrap(), "abc");
        assert!(matches!(
            resolve_api_key(Some("   ".to_string())),
            Err(ConfigError::MissingApiKey(API_KEY_ENV))
        ));
        assert!(matches!(resolve_api_key(None), Err(ConfigError::MissingApiKey(_))));
    }
}
