//! nifty-sentiment CLI
//!
//! # Usage
//!
//! ```bash
//! # Classify from numbers you already have
//! nifty-sentiment analyze --reference 18000 --previous-close 17950 --correlated-pct 0.5
//!
//! # Fetch quotes for a session and classify (needs FMP_API_KEY)
//! nifty-sentiment fetch --date 2024-05-10 --config config/default.toml
//!
//! # Keep a record and review it later
//! nifty-sentiment fetch --date 2024-05-10 --history results/history.json
//! nifty-sentiment history --history results/history.json
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use nifty_sentiment::calendar::parse_date;
use nifty_sentiment::config::api_key_from_env;
use nifty_sentiment::data::fetch_inputs;
use nifty_sentiment::{
    AnalysisHistory, AppConfig, FmpClient, MarketSnapshot, MovementPredictor, MovementVerdict,
};

const SEPARATOR: &str = "============================================================";

#[derive(Parser)]
#[command(name = "nifty-sentiment")]
#[command(about = "Market opening gap classification and movement prediction")]
#[command(version)]
struct Cli {
    /// Path to configuration file (defaults are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify from manually supplied values
    Analyze {
        /// Pre-market reference value (e.g. GIFT Nifty)
        #[arg(long, allow_negative_numbers = true)]
        reference: f64,

        /// Prior session close of the domestic index
        #[arg(long, allow_negative_numbers = true)]
        previous_close: f64,

        /// Correlated index prior-session change, in percent
        #[arg(long, allow_negative_numbers = true)]
        correlated_pct: f64,

        /// Session date to record against (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,

        /// Append the result to this history file
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Fetch quotes for a session and classify
    Fetch {
        /// Session date (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,

        /// Append the result to this history file
        #[arg(long)]
        history: Option<PathBuf>,
    },

    /// Show stored analyses
    History {
        /// History file
        #[arg(long, default_value = "results/history.json")]
        history: PathBuf,
    },
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn resolve_date(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => parse_date(s).context("Invalid --date"),
        None => Ok(today()),
    }
}

fn print_verdict(date: NaiveDate, snapshot: &MarketSnapshot, verdict: &MovementVerdict, json: bool) -> Result<()> {
    if json {
        let out = serde_json::json!({
            "date": date,
            "snapshot": snapshot,
            "verdict": verdict,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", SEPARATOR);
    println!("Market sentiment for {}", date);
    println!("{}", SEPARATOR);
    println!("  Pre-market reference:   {:.2}", snapshot.pre_market_reference);
    println!("  Previous close:         {:.2}", snapshot.previous_close);
    println!("  Gap (points):           {:+.2}", snapshot.gap_points());
    println!("  Correlated change:      {:+.2}%", snapshot.correlated_index_change_pct);
    println!();
    println!("  Opening:                {}", verdict.gap);
    println!("  Correlated sentiment:   {}", verdict.correlated_sentiment);
    println!("  Projected close:        {:.2}", verdict.projected_close);
    println!("  Expected movement:      {}", verdict.movement);
    println!("{}", SEPARATOR);
    Ok(())
}

fn append_history(path: &Path, date: NaiveDate, snapshot: MarketSnapshot, verdict: MovementVerdict) -> Result<()> {
    let mut history = AnalysisHistory::load(path)
        .with_context(|| format!("Failed to load history from {}", path.display()))?;
    history.record(date, snapshot, verdict);
    history
        .save(path)
        .with_context(|| format!("Failed to save history to {}", path.display()))?;
    info!(path = %path.display(), records = history.len(), "Recorded analysis");
    Ok(())
}

fn evaluate(predictor: &MovementPredictor, snapshot: &MarketSnapshot) -> Result<MovementVerdict> {
    predictor
        .predict(snapshot)
        .context("Snapshot rejected by the engine")
}

fn cmd_analyze(
    config: &AppConfig,
    snapshot: MarketSnapshot,
    date: NaiveDate,
    json: bool,
    history: Option<PathBuf>,
) -> Result<()> {
    let predictor = config.predictor()?;
    let verdict = evaluate(&predictor, &snapshot)?;
    print_verdict(date, &snapshot, &verdict, json)?;

    if let Some(path) = history {
        append_history(&path, date, snapshot, verdict)?;
    }
    Ok(())
}

async fn cmd_fetch(config: &AppConfig, date: NaiveDate, json: bool, history: Option<PathBuf>) -> Result<()> {
    let calendar = config.trading_calendar();
    calendar
        .validate(date, today())
        .context("Date is not an analysable session")?;

    let predictor = config.predictor()?;
    let api_key = api_key_from_env()?;
    let mut client = FmpClient::new(config.fmp_config(api_key)).context("Failed to build HTTP client")?;

    info!(
        %date,
        prior_session = %calendar.previous_trading_day(date),
        symbols = ?config.symbols,
        "Fetching quotes"
    );
    let inputs = fetch_inputs(&mut client, &config.symbols, &calendar, date)
        .await
        .context("Failed to fetch quotes")?;

    for (field, reason) in inputs.unavailable_fields() {
        warn!(field, reason, "Input unavailable");
    }
    let snapshot = inputs
        .into_snapshot()
        .context("Cannot classify without all three inputs")?;

    let verdict = evaluate(&predictor, &snapshot)?;
    print_verdict(date, &snapshot, &verdict, json)?;

    if let Some(path) = history {
        append_history(&path, date, snapshot, verdict)?;
    }
    Ok(())
}

fn cmd_history(path: &Path) -> Result<()> {
    let history = AnalysisHistory::load(path)
        .with_context(|| format!("Failed to load history from {}", path.display()))?;

    if history.is_empty() {
        println!("No analyses recorded in {}", path.display());
        return Ok(());
    }

    println!("{}", SEPARATOR);
    println!("{} analyses in {}", history.len(), path.display());
    println!("{}", SEPARATOR);
    for record in history.records() {
        println!(
            "  {}  {:<22} {:<9} corr {:<8} projected {:.2}",
            record.date,
            record.verdict.gap.label(),
            record.verdict.movement.label(),
            record.verdict.correlated_sentiment.label(),
            record.verdict.projected_close,
        );
    }

    println!();
    println!("Opening distribution:");
    for stats in history.gap_stats().values() {
        println!(
            "  {:<22} {:>4} days  {:>6.1}%",
            stats.gap.label(),
            stats.days,
            stats.pct_of_total
        );
    }
    Ok(())
}

/// A missing `.env` is fine; anything else (bad syntax, unreadable file) is reported.
fn dotenv_error(result: dotenvy::Result<PathBuf>) -> Option<dotenvy::Error> {
    match result {
        Err(e) if !e.not_found() => Some(e),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Loaded before the subscriber so RUST_LOG may come from .env
    let dotenv = dotenv_error(dotenvy::dotenv());

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nifty_sentiment=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = dotenv {
        warn!(error = %e, "Failed to load .env");
    }

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Analyze {
            reference,
            previous_close,
            correlated_pct,
            date,
            json,
            history,
        } => {
            let snapshot = MarketSnapshot::new(reference, previous_close, correlated_pct);
            let date = resolve_date(date.as_deref())?;
            cmd_analyze(&config, snapshot, date, json, history)?;
        }
        Commands::Fetch { date, json, history } => {
            let date = resolve_date(date.as_deref())?;
            cmd_fetch(&config, date, json, history).await?;
        }
        Commands::History { history } => {
            cmd_history(&history)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_missing_dotenv_is_silent() {
        let missing = dotenvy::Error::Io(io::Error::from(io::ErrorKind::NotFound));
        assert!(dotenv_error(Err(missing)).is_none());
        assert!(dotenv_error(Ok(PathBuf::from(".env"))).is_none());
    }

    #[test]
    fn test_broken_dotenv_is_reported() {
        let malformed = dotenvy::Error::LineParse("FMP_API_KEY='abc".to_string(), 12);
        assert!(matches!(dotenv_error(Err(malformed)), Some(dotenvy::Error::LineParse(..))));

        let denied = dotenvy::Error::Io(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(dotenv_error(Err(denied)).is_some());
    }
}
