//! Core data types for quote resolution.
//!
//! Provider bars keep prices as `Decimal`. They only become `f64` at the
//! snapshot boundary, and a failed conversion is reported as unavailable
//! rather than silently turned into zero.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::MarketSnapshot;

/// Daily OHLCV bar for an index or proxy instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: i64,
}

impl DailyBar {
    pub fn open_f64(&self) -> Option<f64> {
        decimal_to_f64(self.open)
    }

    pub fn close_f64(&self) -> Option<f64> {
        decimal_to_f64(self.close)
    }
}

fn decimal_to_f64(value: Decimal) -> Option<f64> {
    f64::try_from(value).ok().filter(|v| v.is_finite())
}

/// Symbols used to build a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolSet {
    /// Instrument trading ahead of the domestic open (SGX / GIFT Nifty).
    pub pre_market_proxy: String,
    /// Domestic benchmark index.
    pub benchmark: String,
    /// Foreign index whose prior session is the proxy signal.
    pub correlated: String,
}

impl Default for SymbolSet {
    fn default() -> Self {
        Self {
            pre_market_proxy: "GIFTNIFTY".to_string(),
            benchmark: "^NSEI".to_string(),
            correlated: "^DJI".to_string(),
        }
    }
}

/// A resolved quote, or an explicit marker that none could be resolved.
#[derive(Debug, Clone, PartialEq)]
pub enum QuoteValue {
    Available(f64),
    Unavailable { reason: String },
}

impl QuoteValue {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Wrap a number, treating NaN and infinities as unavailable.
    pub fn from_f64(value: f64) -> Self {
        if value.is_finite() {
            Self::Available(value)
        } else {
            Self::unavailable(format!("non-finite value {}", value))
        }
    }

    /// Wrap an optional number with the reason to report when it is missing.
    pub fn from_option(value: Option<f64>, reason: impl Into<String>) -> Self {
        match value {
            Some(v) => Self::from_f64(v),
            None => Self::unavailable(reason),
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Available(v) => Some(*v),
            Self::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Available(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SnapshotError {
    #[error("Data unavailable for {field}: {reason}")]
    DataUnavailable { field: &'static str, reason: String },
}

/// The three engine inputs before availability has been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotInputs {
    pub reference: QuoteValue,
    pub previous_close: QuoteValue,
    pub correlated_change_pct: QuoteValue,
}

impl SnapshotInputs {
    fn fields(&self) -> [(&'static str, &QuoteValue); 3] {
        [
            ("pre_market_reference", &self.reference),
            ("previous_close", &self.previous_close),
            ("correlated_index_change_pct", &self.correlated_change_pct),
        ]
    }

    /// Names and reasons of every field that could not be resolved.
    pub fn unavailable_fields(&self) -> Vec<(&'static str, &str)> {
        self.fields()
            .into_iter()
            .filter_map(|(name, quote)| match quote {
                QuoteValue::Unavailable { reason } => Some((name, reason.as_str())),
                QuoteValue::Available(_) => None,
            })
            .collect()
    }

    /// Build a snapshot, failing on the first unavailable field.
    pub fn into_snapshot(self) -> Result<MarketSnapshot, SnapshotError> {
        let reference = require("pre_market_reference", self.reference)?;
        let previous_close = require("previous_close", self.previous_close)?;
        let pct = require("correlated_index_change_pct", self.correlated_change_pct)?;
        Ok(MarketSnapshot::new(reference, previous_close, pct))
    }
}

fn require(field: &'static str, quote: QuoteValue) -> Result<f64, SnapshotError> {
    match quote {
        QuoteValue::Available(value) => Ok(value),
        QuoteValue::Unavailable { reason } => Err(SnapshotError::DataUnavailable { field, reason }),
    }
}
