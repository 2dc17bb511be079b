//! Batch-level models: the tracked batch, its request inputs and the
//! routing hand-off produced on completion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::job::{BatchJob, JobStatus};
use super::stock::StockInfo;

/// A fan-out of report jobs sharing one backend `batch_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub batch_id: String,
    /// Aggregate progress exactly as reported by the backend
    pub overall_progress: u8,
    /// Last batch-level status string from the backend, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub jobs: Vec<BatchJob>,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    pub fn new(batch_id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            batch_id: batch_id.into(),
            overall_progress: 0,
            status: None,
            jobs: Vec::new(),
            created_at,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.overall_progress >= 100
    }

    pub fn job(&self, symbol: &str) -> Option<&BatchJob> {
        self.jobs.iter().find(|job| job.symbol == symbol)
    }

    pub fn summary(&self) -> JobSummary {
        let mut summary = JobSummary::default();
        for job in &self.jobs {
            match job.status {
                JobStatus::Completed => summary.completed += 1,
                JobStatus::Failed => summary.failed += 1,
                JobStatus::Queued | JobStatus::InProgress => summary.pending += 1,
            }
        }
        summary
    }
}

/// Job counts by outcome
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSummary {
    pub completed: usize,
    pub failed: usize,
    pub pending: usize,
}

/// Report sections to generate for every symbol in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionFlags {
    pub company_overview: bool,
    pub sector_review: bool,
    pub valuation: bool,
    pub sentiment: bool,
    pub investment_thesis: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown report section '{0}'")]
pub struct UnknownSection(pub String);

impl SectionFlags {
    pub fn all() -> Self {
        Self {
            company_overview: true,
            sector_review: true,
            valuation: true,
            sentiment: true,
            investment_thesis: true,
        }
    }

    pub fn none() -> Self {
        Self {
            company_overview: false,
            sector_review: false,
            valuation: false,
            sentiment: false,
            investment_thesis: false,
        }
    }

    pub fn any_selected(&self) -> bool {
        self.company_overview
            || self.sector_review
            || self.valuation
            || self.sentiment
            || self.investment_thesis
    }

    /// Build flags from section names such as `overview,valuation`
    pub fn from_names<I, S>(names: I) -> Result<Self, UnknownSection>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut flags = Self::none();
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            match name.to_ascii_lowercase().as_str() {
                "overview" | "company_overview" => flags.company_overview = true,
                "sector" | "sector_review" => flags.sector_review = true,
                "valuation" | "valuation_analysis" => flags.valuation = true,
                "sentiment" | "sentiment_analysis" => flags.sentiment = true,
                "thesis" | "investment_thesis" => flags.investment_thesis = true,
                _ => return Err(UnknownSection(name.to_string())),
            }
        }
        Ok(flags)
    }
}

impl Default for SectionFlags {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("at least one stock symbol is required")]
pub struct EmptySymbolSet;

/// Non-empty, ordered, de-duplicated set of upper-case symbols
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SymbolSet(Vec<String>);

impl SymbolSet {
    /// Trims and upper-cases every symbol, drops blanks and keeps the first
    /// occurrence of duplicates
    pub fn new<I, S>(symbols: I) -> Result<Self, EmptySymbolSet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for symbol in symbols {
            let symbol = symbol.as_ref().trim().to_ascii_uppercase();
            if symbol.is_empty() {
                continue;
            }
            if seen.insert(symbol.clone()) {
                ordered.push(symbol);
            } else {
                tracing::debug!(symbol = %symbol, "Dropping duplicate symbol from batch");
            }
        }

        if ordered.is_empty() {
            return Err(EmptySymbolSet);
        }
        Ok(Self(ordered))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a SymbolSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Hand-off to the results view once a batch finishes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingIntent {
    pub batch_id: String,
    /// Results view path, e.g. `/reports/batch/<batch_id>`
    pub path: String,
    pub jobs: Vec<BatchJob>,
    pub stocks: Vec<StockInfo>,
    pub summary: JobSummary,
}

impl RoutingIntent {
    pub fn failed_jobs(&self) -> impl Iterator<Item = &BatchJob> {
        self.jobs.iter().filter(|job| job.is_failed())
    }

    pub fn all_succeeded(&self) -> bool {
        self.summary.failed == 0 && self.summary.pending == 0
    }
}
