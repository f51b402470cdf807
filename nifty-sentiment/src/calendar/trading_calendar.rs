//! Exchange sessions: weekends, configured holidays, and the window of dates
//! that may be analysed.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalendarError {
    #[error("Invalid date format '{0}', expected YYYY-MM-DD")]
    InvalidFormat(String),

    #[error("{0} is a weekend")]
    Weekend(NaiveDate),

    #[error("{0} is an exchange holiday")]
    Holiday(NaiveDate),

    #[error("{date} is after today ({today})")]
    InFuture { date: NaiveDate, today: NaiveDate },

    #[error("{date} is more than {lookback_days} days before {today}")]
    OutsideWindow {
        date: NaiveDate,
        today: NaiveDate,
        lookback_days: i64,
    },
}

/// Upper bound on `lookback_days` (ten years).
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, CalendarError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| CalendarError::InvalidFormat(s.to_string()))
}

/// Calendar configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Exchange holidays (no session).
    pub holidays: Vec<NaiveDate>,
    /// How far back an analysis date may lie.
    pub lookback_days: i64,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            holidays: Vec::new(),
            lookback_days: 10,
        }
    }
}

/// Weekday + holiday calendar.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    holidays: BTreeSet<NaiveDate>,
    lookback_days: i64,
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::new(CalendarConfig::default())
    }
}

impl TradingCalendar {
    pub fn new(config: CalendarConfig) -> Self {
        Self {
            holidays: config.holidays.into_iter().collect(),
            lookback_days: config.lookback_days.clamp(0, MAX_LOOKBACK_DAYS),
        }
    }

    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    pub fn is_trading_day(&self, date: NaiveDate) -> bool {
        !Self::is_weekend(date) && !self.is_holiday(date)
    }

    /// Check that `date` is a session inside the window ending at `today`.
    pub fn validate(&self, date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, CalendarError> {
        if date > today {
            return Err(CalendarError::InFuture { date, today });
        }
        // A window reaching past the earliest representable date has no lower bound.
        let window_start = today.checked_sub_signed(Duration::days(self.lookback_days));
        if window_start.is_some_and(|start| date < start) {
            return Err(CalendarError::OutsideWindow {
                date,
                today,
                lookback_days: self.lookback_days,
            });
        }
        if Self::is_weekend(date) {
            return Err(CalendarError::Weekend(date));
        }
        if self.is_holiday(date) {
            return Err(CalendarError::Holiday(date));
        }
        Ok(date)
    }

    /// Last session strictly before `date`.
    pub fn previous_trading_day(&self, date: NaiveDate) -> NaiveDate {
        let mut prev = date - Duration::days(1);
        while !self.is_trading_day(prev) {
            prev -= Duration::days(1);
        }
        prev
    }

    /// All sessions in `[start, end]`.
    pub fn trading_days(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let mut days = Vec::new();
        let mut current = start;
        while current <= end {
            if self.is_trading_day(current) {
                days.push(current);
            }
            current += Duration::days(1);
        }
        days
    }
}
