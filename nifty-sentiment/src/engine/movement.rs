//! Intraday movement predictor.
//!
//! Combines the opening gap with the correlated index's prior-session move.
//! The correlated move is applied multiplicatively to the domestic
//! pre-market reference to get a projected close, and the distance between
//! the two decides the movement.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};
use super::gap::{GapClassification, GapClassifier, GapThresholds};
use super::numeric::{apply_percent, ensure_finite};

/// Inputs for one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Pre-market proxy value for the domestic index.
    pub pre_market_reference: f64,
    /// Domestic index close of the prior session.
    pub previous_close: f64,
    /// Correlated index prior-session change, in percent.
    pub correlated_index_change_pct: f64,
}

impl MarketSnapshot {
    pub fn new(pre_market_reference: f64, previous_close: f64, correlated_index_change_pct: f64) -> Self {
        Self {
            pre_market_reference,
            previous_close,
            correlated_index_change_pct,
        }
    }

    /// Signed opening gap in index points.
    pub fn gap_points(&self) -> f64 {
        self.pre_market_reference - self.previous_close
    }
}

/// Direction of the correlated index's prior session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CorrelatedSentiment {
    Positive,
    Negative,
    Neutral,
}

impl CorrelatedSentiment {
    pub fn from_change_pct(pct: f64) -> Self {
        if pct > 0.0 {
            Self::Positive
        } else if pct < 0.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for CorrelatedSentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Expected intraday movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Movement {
    Bullish,
    Bearish,
    Sideways,
}

impl Movement {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bullish => "Bullish",
            Self::Bearish => "Bearish",
            Self::Sideways => "Sideways",
        }
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementVerdict {
    pub gap: GapClassification,
    pub correlated_sentiment: CorrelatedSentiment,
    pub projected_close: f64,
    pub movement: Movement,
}

/// Movement band configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// The sideways band is `band_multiplier * |reference|` on either side.
    pub band_multiplier: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self { band_multiplier: 2.0 }
    }
}

impl MovementConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if !self.band_multiplier.is_finite() || self.band_multiplier < 0.0 {
            return Err(EngineError::InvalidThresholds(format!(
                "band_multiplier must be finite and non-negative, got {}",
                self.band_multiplier
            )));
        }
        Ok(())
    }
}

/// Gap classifier plus movement projection.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MovementPredictor {
    classifier: GapClassifier,
    config: MovementConfig,
}

impl MovementPredictor {
    pub fn new(thresholds: GapThresholds, config: MovementConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(Self {
            classifier: GapClassifier::new(thresholds)?,
            config,
        })
    }

    pub fn classifier(&self) -> &GapClassifier {
        &self.classifier
    }

    pub fn config(&self) -> &MovementConfig {
        &self.config
    }

    /// Evaluate a snapshot.
    pub fn predict(&self, snapshot: &MarketSnapshot) -> EngineResult<MovementVerdict> {
        let reference = ensure_finite("pre_market_reference", snapshot.pre_market_reference)?;
        let change_pct = ensure_finite(
            "correlated_index_change_pct",
            snapshot.correlated_index_change_pct,
        )?;

        let gap = self.classifier.classify(reference, snapshot.previous_close)?;
        let correlated_sentiment = CorrelatedSentiment::from_change_pct(change_pct);

        let projected_close = ensure_finite("projected_close", apply_percent(reference, change_pct))?;
        let delta = projected_close - reference;
        let threshold = self.config.band_multiplier * reference.abs();

        let movement = if delta > threshold {
            Movement::Bullish
        } else if delta < -threshold {
            Movement::Bearish
        } else {
            Movement::Sideways
        };

        Ok(MovementVerdict {
            gap,
            correlated_sentiment,
            projected_close,
            movement,
        })
    }
}

/// Evaluate a snapshot with the canonical thresholds.
pub fn predict_movement(snapshot: &MarketSnapshot) -> EngineResult<MovementVerdict> {
    MovementPredictor::default().predict(snapshot)
}
