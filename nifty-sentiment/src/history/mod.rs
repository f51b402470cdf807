//! Caller-retained analysis history.
//!
//! The engine keeps nothing between calls. Callers that want a record of
//! past verdicts append them here and persist the list as JSON.

pub mod store;

pub use store::{AnalysisHistory, AnalysisRecord, GapStats, HistoryError};
