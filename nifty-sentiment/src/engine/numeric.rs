//! Small numeric helpers shared by the classifier, the predictor and the
//! snapshot resolver.

use super::error::{EngineError, EngineResult};

/// Reject NaN and infinities, naming the offending field.
pub fn ensure_finite(field: &'static str, value: f64) -> EngineResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::InvalidInput { field, value })
    }
}

/// Percentage change from `from` to `to`.
///
/// Returns `None` when `from` is zero or either side is non-finite, so a
/// missing base never turns into a fake 0% move.
pub fn percent_change(from: f64, to: f64) -> Option<f64> {
    if !from.is_finite() || !to.is_finite() || from == 0.0 {
        return None;
    }
    let pct = (to - from) / from * 100.0;
    pct.is_finite().then_some(pct)
}

/// Scale `base` by a percentage move (`pct = 1.5` means +1.5%).
pub fn apply_percent(base: f64, pct: f64) -> f64 {
    base * (1.0 + pct / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite("x", 0.0), Ok(0.0));
        assert_eq!(ensure_finite("x", -12.5), Ok(-12.5));
        assert!(ensure_finite("x", f64::NAN).is_err());
        assert!(ensure_finite("x", f64::INFINITY).is_err());
        assert!(ensure_finite("x", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_ensure_finite_names_field() {
        match ensure_finite("previous_close", f64::INFINITY) {
            Err(EngineError::InvalidInput { field, .. }) => assert_eq!(field, "previous_close"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_percent_change() {
        assert_relative_eq!(percent_change(100.0, 101.5).unwrap(), 1.5, epsilon = 1e-9);
        assert_relative_eq!(percent_change(200.0, 150.0).unwrap(), -25.0, epsilon = 1e-9);
        assert_eq!(percent_change(0.0, 10.0), None);
        assert_eq!(percent_change(f64::NAN, 10.0), None);
        assert_eq!(percent_change(10.0, f64::INFINITY), None);
    }

    #[test]
    fn test_apply_percent() {
        assert_relative_eq!(apply_percent(18000.0, 0.5), 18090.0, epsilon = 1e-9);
        assert_relative_eq!(apply_percent(18000.0, -1.0), 17820.0, epsilon = 1e-9);
        assert_eq!(apply_percent(0.0, 5.0), 0.0);
    }
}
