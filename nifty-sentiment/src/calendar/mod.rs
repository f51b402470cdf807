//! Trading session calendar.
//!
//! Decides whether a date can be analysed:
//! - Weekends and configured exchange holidays are not sessions
//! - Only dates within the lookback window ending today are accepted

pub mod trading_calendar;

pub use trading_calendar::{
    parse_date, CalendarConfig, CalendarError, TradingCalendar, MAX_LOOKBACK_DAYS,
};
