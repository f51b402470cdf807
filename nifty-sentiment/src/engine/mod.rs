//! Market opening classification and movement prediction.
//!
//! Two stateless stages:
//! - Gap classifier: pre-market reference vs prior close, flat / gap / huge gap
//! - Movement predictor: gap plus correlated index move, projected close and
//!   bullish / bearish / sideways
//!
//! Everything here is pure. Fetching quotes, calendars and history live in
//! the surrounding modules.

pub mod error;
pub mod gap;
pub mod movement;
pub mod numeric;

pub use error::{EngineError, EngineResult};
pub use gap::{classify_gap, GapClassification, GapClassifier, GapThresholds};
pub use movement::{
    predict_movement, CorrelatedSentiment, MarketSnapshot, Movement, MovementConfig,
    MovementPredictor, MovementVerdict,
};
