pub mod calendar;
pub mod config;
pub mod data;
pub mod engine;
pub mod history;

// Re-export commonly used types
pub use engine::{
    classify_gap, predict_movement, CorrelatedSentiment, EngineError, GapClassification,
    GapClassifier, GapThresholds, MarketSnapshot, Movement, MovementConfig, MovementPredictor,
    MovementVerdict,
};
pub use data::{DailyBar, FmpClient, FmpConfig, QuoteValue, SnapshotError, SnapshotInputs, SymbolSet};
pub use calendar::{CalendarError, TradingCalendar};
pub use history::{AnalysisHistory, AnalysisRecord};
pub use config::{AppConfig, ConfigError};
