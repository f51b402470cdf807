//! JSON-backed store of past verdicts, with per-opening statistics.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::engine::{GapClassification, MarketSnapshot, MovementVerdict};

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse history file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One stored analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    /// Session the analysis was made for.
    pub date: NaiveDate,
    pub snapshot: MarketSnapshot,
    pub verdict: MovementVerdict,
    pub recorded_at: DateTime<Utc>,
}

/// Per-gap statistics over a history.
#[derive(Debug, Clone, PartialEq)]
pub struct GapStats {
    pub gap: GapClassification,
    pub days: usize,
    pub pct_of_total: f64,
}

/// Ordered list of stored analyses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisHistory {
    records: Vec<AnalysisRecord>,
}

impl AnalysisHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file. A missing file is an empty history.
    pub fn load(path: &Path) -> Result<Self, HistoryError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let history: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), records = history.len(), "Loaded history");
        Ok(history)
    }

    pub fn save(&self, path: &Path) -> Result<(), HistoryError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        debug!(path = %path.display(), records = self.len(), "Saved history");
        Ok(())
    }

    /// Append an analysis and return the stored record.
    pub fn record(
        &mut self,
        date: NaiveDate,
        snapshot: MarketSnapshot,
        verdict: MovementVerdict,
    ) -> &AnalysisRecord {
        self.records.push(AnalysisRecord {
            date,
            snapshot,
            verdict,
            recorded_at: Utc::now(),
        });
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[AnalysisRecord] {
        &self.records
    }

    pub fn latest(&self) -> Option<&AnalysisRecord> {
        self.records.last()
    }

    /// Most recent analysis for a given session.
    pub fn for_date(&self, date: NaiveDate) -> Option<&AnalysisRecord> {
        self.records.iter().rev().find(|r| r.date == date)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Count and share of each gap class.
    pub fn gap_stats(&self) -> BTreeMap<GapClassification, GapStats> {
        let mut stats: BTreeMap<GapClassification, GapStats> = BTreeMap::new();
        let total = self.records.len();

        for record in &self.records {
            let gap = record.verdict.gap;
            stats
                .entry(gap)
                .or_insert_with(|| GapStats {
                    gap,
                    days: 0,
                    pct_of_total: 0.0,
                })
                .days += 1;
        }

        for entry in stats.values_mut() {
            entry.pct_of_total = entry.days as f64 / total as f64 * 100.0;
        }

        stats
    }
}
