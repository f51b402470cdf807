pub mod fmp;
pub mod resolver;
pub mod types;

pub use fmp::{parse_historical, FmpClient, FmpConfig, FmpError, RawHistoricalBar};
pub use resolver::{fetch_bar_set, fetch_inputs, fetch_window_start, resolve_inputs, BarSet};
pub use types::{DailyBar, QuoteValue, SnapshotError, SnapshotInputs, SymbolSet};
