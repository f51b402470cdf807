//! Opening gap classifier.
//!
//! Buckets the difference between the pre-market reference and the prior
//! session's close. Rules are evaluated in a fixed order so that the
//! inclusive flat band wins at its own edges:
//!
//! 1. `-flat <= d <= flat` -> Flat opening
//! 2. `d > huge`           -> Huge gap up
//! 3. `d > flat`           -> Gap up
//! 4. `d < -huge`          -> Huge gap down
//! 5. `d < -flat`          -> Gap down

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{EngineError, EngineResult};
use super::numeric::ensure_finite;

/// Half-width of the flat band, in index points.
pub const DEFAULT_FLAT_BAND: f64 = 40.0;

/// Gap size beyond which a gap counts as huge, in index points.
pub const DEFAULT_HUGE_GAP: f64 = 100.0;

/// Qualitative opening classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GapClassification {
    FlatOpening,
    GapUp,
    HugeGapUp,
    GapDown,
    HugeGapDown,
}

impl GapClassification {
    /// All classes, in rule order.
    pub const ALL: [GapClassification; 5] = [
        Self::FlatOpening,
        Self::HugeGapUp,
        Self::GapUp,
        Self::HugeGapDown,
        Self::GapDown,
    ];

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::FlatOpening => "Flat Opening",
            Self::GapUp => "Gap Up Opening",
            Self::HugeGapUp => "Huge Gap Up Opening",
            Self::GapDown => "Gap Down Opening",
            Self::HugeGapDown => "Huge Gap Down Opening",
        }
    }

    pub fn is_flat(&self) -> bool {
        matches!(self, Self::FlatOpening)
    }

    /// Whether the market is expected to open above the prior close.
    pub fn is_up(&self) -> bool {
        matches!(self, Self::GapUp | Self::HugeGapUp)
    }

    /// Whether the market is expected to open below the prior close.
    pub fn is_down(&self) -> bool {
        matches!(self, Self::GapDown | Self::HugeGapDown)
    }

    pub fn is_huge(&self) -> bool {
        matches!(self, Self::HugeGapUp | Self::HugeGapDown)
    }
}

impl fmt::Display for GapClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Gap thresholds, in index points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapThresholds {
    /// Differences within `[-flat_band, flat_band]` are a flat opening.
    pub flat_band: f64,
    /// Differences strictly beyond `huge_gap` are huge gaps.
    pub huge_gap: f64,
}

impl Default for GapThresholds {
    fn default() -> Self {
        Self {
            flat_band: DEFAULT_FLAT_BAND,
            huge_gap: DEFAULT_HUGE_GAP,
        }
    }
}

impl GapThresholds {
    /// Check that the thresholds describe a partition of the real line.
    pub fn validate(&self) -> EngineResult<()> {
        if !self.flat_band.is_finite() || !self.huge_gap.is_finite() {
            return Err(EngineError::InvalidThresholds(format!(
                "thresholds must be finite (flat_band={}, huge_gap={})",
                self.flat_band, self.huge_gap
            )));
        }
        if self.flat_band < 0.0 {
            return Err(EngineError::InvalidThresholds(format!(
                "flat_band must be non-negative, got {}",
                self.flat_band
            )));
        }
        if self.huge_gap < self.flat_band {
            return Err(EngineError::InvalidThresholds(format!(
                "huge_gap ({}) must not be below flat_band ({})",
                self.huge_gap, self.flat_band
            )));
        }
        Ok(())
    }
}

/// Opening gap classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GapClassifier {
    thresholds: GapThresholds,
}

impl GapClassifier {
    /// Create a classifier with custom thresholds.
    pub fn new(thresholds: GapThresholds) -> EngineResult<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &GapThresholds {
        &self.thresholds
    }

    /// Classify the gap between the pre-market reference and the prior close.
    pub fn classify(&self, reference: f64, previous_close: f64) -> EngineResult<GapClassification> {
        let reference = ensure_finite("pre_market_reference", reference)?;
        let previous_close = ensure_finite("previous_close", previous_close)?;
        Ok(self.classify_difference(reference - previous_close))
    }

    /// Classify a raw difference. Infinite differences (overflow of two
    /// finite extremes) land in the huge buckets.
    pub fn classify_difference(&self, difference: f64) -> GapClassification {
        let flat = self.thresholds.flat_band;
        let huge = self.thresholds.huge_gap;

        if (-flat..=flat).contains(&difference) {
            GapClassification::FlatOpening
        } else if difference > huge {
            GapClassification::HugeGapUp
        } else if difference > flat {
            GapClassification::GapUp
        } else if difference < -huge {
            GapClassification::HugeGapDown
        } else {
            // difference < -flat: everything else was ruled out above
            GapClassification::GapDown
        }
    }
}

/// Classify with the canonical 40/100 point thresholds.
pub fn classify_gap(reference: f64, previous_close: f64) -> EngineResult<GapClassification> {
    GapClassifier::default().classify(reference, previous_close)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_diff(d: f64) -> GapClassification {
        GapClassifier::default().classify_difference(d)
    }

    /// Independent interval membership, used to check the ordered rules.
    fn intervals_containing(d: f64) -> Vec<GapClassification> {
        let mut hits = Vec::new();
        if (-40.0..=40.0).contains(&d) {
            hits.push(GapClassification::FlatOpening);
        }
        if d > 40.0 && d <= 100.0 {
            hits.push(GapClassification::GapUp);
        }
        if d > 100.0 {
            hits.push(GapClassification::HugeGapUp);
        }
        if (-100.0..-40.0).contains(&d) {
            hits.push(GapClassification::GapDown);
        }
        if d < -100.0 {
            hits.push(GapClassification::HugeGapDown);
        }
        hits
    }

    #[test]
    fn test_positive_boundaries() {
        assert_eq!(classify_diff(40.0), GapClassification::FlatOpening);
        assert_eq!(classify_diff(40.0001), GapClassification::GapUp);
        assert_eq!(classify_diff(100.0), GapClassification::GapUp);
        assert_eq!(classify_diff(100.0001), GapClassification::HugeGapUp);
    }

    #[test]
    fn test_negative_boundaries() {
        assert_eq!(classify_diff(-40.0), GapClassification::FlatOpening);
        assert_eq!(classify_diff(-40.0001), GapClassification::GapDown);
        assert_eq!(classify_diff(-100.0), GapClassification::GapDown);
        assert_eq!(classify_diff(-100.0001), GapClassification::HugeGapDown);
    }

    #[test]
    fn test_partition_has_no_gaps_or_overlaps() {
        let mut seen = Vec::new();
        let mut d = -250.0;
        while d <= 250.0 {
            let hits = intervals_containing(d);
            assert_eq!(hits.len(), 1, "difference {} matched {:?}", d, hits);
            assert_eq!(classify_diff(d), hits[0], "difference {}", d);
            if !seen.contains(&hits[0]) {
                seen.push(hits[0]);
            }
            d += 0.25;
        }
        for class in GapClassification::ALL {
            assert!(seen.contains(&class), "{} never produced", class);
        }
    }

    #[test]
    fn test_classify_uses_reference_minus_close() {
        assert_eq!(classify_gap(18000.0, 17950.0), Ok(GapClassification::GapUp));
        assert_eq!(classify_gap(17900.0, 18000.0), Ok(GapClassification::GapDown));
        assert_eq!(classify_gap(18000.0, 18000.0), Ok(GapClassification::FlatOpening));
        assert_eq!(classify_gap(18500.0, 18000.0), Ok(GapClassification::HugeGapUp));
        assert_eq!(classify_gap(17500.0, 18000.0), Ok(GapClassification::HugeGapDown));
    }

    #[test]
    fn test_zero_and_negative_values_classify() {
        assert_eq!(classify_gap(0.0, 0.0), Ok(GapClassification::FlatOpening));
        assert_eq!(classify_gap(0.0, 18000.0), Ok(GapClassification::HugeGapDown));
        assert_eq!(classify_gap(-50.0, 0.0), Ok(GapClassification::GapDown));
    }

    #[test]
    fn test_overflowing_difference_still_classifies() {
        assert_eq!(classify_gap(f64::MAX, -f64::MAX), Ok(GapClassification::HugeGapUp));
        assert_eq!(classify_gap(-f64::MAX, f64::MAX), Ok(GapClassification::HugeGapDown));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(matches!(
            classify_gap(f64::NAN, 18000.0),
            Err(EngineError::InvalidInput { field: "pre_market_reference", .. })
        ));
        assert!(matches!(
            classify_gap(18000.0, f64::INFINITY),
            Err(EngineError::InvalidInput { field: "previous_close", .. })
        ));
    }

    #[test]
    fn test_custom_thresholds() {
        let classifier = GapClassifier::new(GapThresholds {
            flat_band: 10.0,
            huge_gap: 25.0,
        })
        .unwrap();
        assert_eq!(classifier.classify_difference(10.0), GapClassification::FlatOpening);
        assert_eq!(classifier.classify_difference(20.0), GapClassification::GapUp);
        assert_eq!(classifier.classify_difference(-30.0), GapClassification::HugeGapDown);
    }

    #[test]
    fn test_degenerate_thresholds_still_partition() {
        // Zero-width flat band and no separate gap band.
        let classifier = GapClassifier::new(GapThresholds {
            flat_band: 0.0,
            huge_gap: 0.0,
        })
        .unwrap();
        assert_eq!(classifier.classify_difference(0.0), GapClassification::FlatOpening);
        assert_eq!(classifier.classify_difference(0.5), GapClassification::HugeGapUp);
        assert_eq!(classifier.classify_difference(-0.5), GapClassification::HugeGapDown);
    }

    #[test]
    fn test_invalid_thresholds() {
        let inverted = GapThresholds {
            flat_band: 100.0,
            huge_gap: 40.0,
        };
        assert!(matches!(
            GapClassifier::new(inverted),
            Err(EngineError::InvalidThresholds(_))
        ));

        let negative = GapThresholds {
            flat_band: -1.0,
            huge_gap: 40.0,
        };
        assert!(negative.validate().is_err());

        let nan = GapThresholds {
            flat_band: f64::NAN,
            huge_gap: 40.0,
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(GapClassification::FlatOpening.to_string(), "Flat Opening");
        assert_eq!(GapClassification::HugeGapDown.label(), "Huge Gap Down Opening");
        assert!(GapClassification::HugeGapUp.is_up());
        assert!(GapClassification::HugeGapUp.is_huge());
        assert!(GapClassification::GapDown.is_down());
        assert!(!GapClassification::GapDown.is_huge());
        assert!(GapClassification::FlatOpening.is_flat());
    }
}
