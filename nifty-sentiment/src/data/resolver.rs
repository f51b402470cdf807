//! Turns fetched bars into engine inputs.
//!
//! For an analysis date `D`:
//! - reference: open of the pre-market proxy's bar dated `D`
//! - previous close: close of the last benchmark bar before `D`
//! - correlated change: % change between the last two correlated closes before `D`
//!
//! Anything that cannot be resolved becomes `QuoteValue::Unavailable`.

use chrono::{Duration, NaiveDate};
use tracing::{info, warn};

use super::fmp::{FmpClient, FmpError};
use super::types::{DailyBar, QuoteValue, SnapshotInputs, SymbolSet};
use crate::calendar::TradingCalendar;
use crate::engine::numeric::percent_change;

/// Calendar days the fetch window grows by. Covers long weekends.
pub const FETCH_LOOKBACK_DAYS: i64 = 10;

/// Domestic sessions the fetch window must hold before the analysis date.
/// The correlated index trades on a foreign calendar, so this is more than
/// the two sessions a change needs.
pub const MIN_PRIOR_SESSIONS: usize = 5;

/// Bars for the three symbols of a snapshot.
#[derive(Debug, Clone, Default)]
pub struct BarSet {
    pub proxy: Vec<DailyBar>,
    pub benchmark: Vec<DailyBar>,
    pub correlated: Vec<DailyBar>,
}

/// Bars strictly before `date`, ascending.
fn sessions_before(date: NaiveDate, bars: &[DailyBar]) -> Vec<&DailyBar> {
    let mut prior: Vec<&DailyBar> = bars.iter().filter(|b| b.date < date).collect();
    prior.sort_by_key(|b| b.date);
    prior
}

pub fn pre_market_reference(date: NaiveDate, bars: &[DailyBar]) -> QuoteValue {
    match bars.iter().find(|b| b.date == date) {
        Some(bar) => QuoteValue::from_option(bar.open_f64(), format!("unconvertible open on {}", date)),
        None => QuoteValue::unavailable(format!("no pre-market bar on {}", date)),
    }
}

pub fn previous_close(date: NaiveDate, bars: &[DailyBar]) -> QuoteValue {
    match sessions_before(date, bars).last() {
        Some(bar) => QuoteValue::from_option(
            bar.close_f64(),
            format!("unconvertible close on {}", bar.date),
        ),
        None => QuoteValue::unavailable(format!("no session before {}", date)),
    }
}

pub fn correlated_change_pct(date: NaiveDate, bars: &[DailyBar]) -> QuoteValue {
    let prior = sessions_before(date, bars);
    let [.., before, last] = prior.as_slice() else {
        return QuoteValue::unavailable(format!(
            "need two sessions before {}, found {}",
            date,
            prior.len()
        ));
    };

    match (before.close_f64(), last.close_f64()) {
        (Some(from), Some(to)) => QuoteValue::from_option(
            percent_change(from, to),
            format!("zero close on {}", before.date),
        ),
        _ => QuoteValue::unavailable(format!(
            "unconvertible close between {} and {}",
            before.date, last.date
        )),
    }
}

/// Resolve all three inputs for `date`.
pub fn resolve_inputs(date: NaiveDate, bars: &BarSet) -> SnapshotInputs {
    SnapshotInputs {
        reference: pre_market_reference(date, &bars.proxy),
        previous_close: previous_close(date, &bars.benchmark),
        correlated_change_pct: correlated_change_pct(date, &bars.correlated),
    }
}

/// First date of the fetch window for `date`: at least `FETCH_LOOKBACK_DAYS`
/// back, widened until it holds `MIN_PRIOR_SESSIONS` sessions.
pub fn fetch_window_start(calendar: &TradingCalendar, date: NaiveDate) -> NaiveDate {
    let end = date - Duration::days(1);
    let mut from = date - Duration::days(FETCH_LOOKBACK_DAYS);
    while calendar.trading_days(from, end).len() < MIN_PRIOR_SESSIONS {
        from -= Duration::days(FETCH_LOOKBACK_DAYS);
    }
    from
}

async fn fetch_or_empty(
    client: &mut FmpClient,
    symbol: &str,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailyBar>, FmpError> {
    match client.historical_bars(symbol, from, to).await {
        Ok(bars) => Ok(bars),
        Err(FmpError::NoData { .. }) => {
            warn!(symbol, %from, %to, "No bars returned, marking unavailable");
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}

/// Fetch the bars needed to analyse `date`.
///
/// A symbol with no data yields an empty series (and later an unavailable
/// input). Transport and API errors are returned as-is.
pub async fn fetch_bar_set(
    client: &mut FmpClient,
    symbols: &SymbolSet,
    calendar: &TradingCalendar,
    date: NaiveDate,
) -> Result<BarSet, FmpError> {
    let from = fetch_window_start(calendar, date);

    let proxy = fetch_or_empty(client, &symbols.pre_market_proxy, date, date).await?;
    let benchmark = fetch_or_empty(client, &symbols.benchmark, from, date).await?;
    let correlated = fetch_or_empty(client, &symbols.correlated, from, date).await?;

    info!(
        %date,
        %from,
        proxy = proxy.len(),
        benchmark = benchmark.len(),
        correlated = correlated.len(),
        "Fetched bars"
    );

    Ok(BarSet {
        proxy,
        benchmark,
        correlated,
    })
}

/// Fetch and resolve in one step.
pub async fn fetch_inputs(
    client: &mut FmpClient,
    symbols: &SymbolSet,
    calendar: &TradingCalendar,
    date: NaiveDate,
) -> Result<SnapshotInputs, FmpError> {
    let bars = fetch_bar_set(client, symbols, calendar, date).await?;
    Ok(resolve_inputs(date, &bars))
}
