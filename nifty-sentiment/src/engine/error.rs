//! Errors raised by the classification engine.

use thiserror::Error;

/// Engine errors.
///
/// The engine only ever rejects non-finite numbers. Zero, negative and
/// extreme values are valid inputs and always produce a verdict.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid input: {field} must be finite, got {value}")]
    InvalidInput { field: &'static str, value: f64 },

    #[error("Invalid thresholds: {0}")]
    InvalidThresholds(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
