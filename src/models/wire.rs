//! JSON bodies exchanged with the report backend
//!
//! Response shapes have drifted across backend versions: the job list has been
//! published as `reports`, `results` or `stocks`, and entries carry the symbol
//! and id under different keys. Decoding resolves those variants explicitly and
//! reports anything else as a [`DecodeError`].

use serde::{Deserialize, Serialize};
use std::fmt;

use super::batch::{SectionFlags, SymbolSet};
use crate::error::DecodeError;

/// Body of `POST /reports/bulk_configure/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkConfigureRequest {
    pub stock_symbols: Vec<String>,
    pub include_company_overview: bool,
    pub include_sector_review: bool,
    pub include_valuation_analysis: bool,
    pub include_sentiment_analysis: bool,
    pub include_investment_thesis: bool,
}

impl BulkConfigureRequest {
    pub fn new(symbols: &SymbolSet, sections: SectionFlags) -> Self {
        Self {
            stock_symbols: symbols.as_slice().to_vec(),
            include_company_overview: sections.company_overview,
            include_sector_review: sections.sector_review,
            include_valuation_analysis: sections.valuation,
            include_sentiment_analysis: sections.sentiment,
            include_investment_thesis: sections.investment_thesis,
        }
    }
}

/// Identifier that may arrive as a JSON string or integer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Text(String),
    Number(i64),
}

impl fmt::Display for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawId::Text(s) => f.write_str(s),
            RawId::Number(n) => write!(f, "{}", n),
        }
    }
}

impl RawId {
    /// Blank text ids count as missing
    pub fn into_non_empty(self) -> Option<String> {
        let id = self.to_string();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// Which key carried the job list in a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobListShape {
    Reports,
    Results,
    Stocks,
}

impl JobListShape {
    pub fn key(&self) -> &'static str {
        match self {
            JobListShape::Reports => "reports",
            JobListShape::Results => "results",
            JobListShape::Stocks => "stocks",
        }
    }
}

/// One job entry as sent by the backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawJobEntry {
    #[serde(default)]
    pub stock_symbol: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub report_id: Option<RawId>,
    #[serde(default)]
    pub id: Option<RawId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub current_step: Option<String>,
}

impl RawJobEntry {
    /// Normalized symbol from `stock_symbol`, falling back to `symbol`
    pub fn resolved_symbol(&self) -> Option<String> {
        self.stock_symbol
            .as_deref()
            .or(self.symbol.as_deref())
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
    }

    /// Report id from `report_id`, falling back to `id`
    pub fn resolved_report_id(&self) -> Option<String> {
        self.report_id
            .clone()
            .and_then(RawId::into_non_empty)
            .or_else(|| self.id.clone().and_then(RawId::into_non_empty))
    }
}

/// Response of both `bulk_configure` and `bulk/{id}/progress`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBatchStatus {
    #[serde(default)]
    pub batch_id: Option<RawId>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub reports: Option<Vec<RawJobEntry>>,
    #[serde(default)]
    pub results: Option<Vec<RawJobEntry>>,
    #[serde(default)]
    pub stocks: Option<Vec<RawJobEntry>>,
}

impl RawBatchStatus {
    pub fn from_json(body: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(body).map_err(|e| DecodeError::Malformed(e.to_string()))
    }

    /// First job list present, in `reports`, `results`, `stocks` order
    pub fn job_entries(&self) -> Result<(JobListShape, &[RawJobEntry]), DecodeError> {
        if let Some(ref entries) = self.reports {
            Ok((JobListShape::Reports, entries))
        } else if let Some(ref entries) = self.results {
            Ok((JobListShape::Results, entries))
        } else if let Some(ref entries) = self.stocks {
            Ok((JobListShape::Stocks, entries))
        } else {
            Err(DecodeError::MissingJobList)
        }
    }

    /// Mutable view of the same job list [`Self::job_entries`] reads
    pub fn job_entries_mut(&mut self) -> Option<&mut Vec<RawJobEntry>> {
        if self.reports.is_some() {
            self.reports.as_mut()
        } else if self.results.is_some() {
            self.results.as_mut()
        } else {
            self.stocks.as_mut()
        }
    }

    pub fn resolved_batch_id(&self) -> Option<String> {
        self.batch_id.clone().and_then(RawId::into_non_empty)
    }

    pub fn overall_progress(&self) -> Option<u8> {
        self.progress.map(clamp_progress)
    }
}

/// Error body fields the backend uses for a human-readable reason
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Extract a readable detail string from a raw error response body
    pub fn detail_from(body: &str) -> Option<String> {
        let body = body.trim();
        if body.is_empty() {
            return None;
        }

        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => [parsed.detail, parsed.error, parsed.message]
                .into_iter()
                .flatten()
                .find_map(|value| match value {
                    serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                    serde_json::Value::Null => None,
                    serde_json::Value::String(_) => None,
                    other => Some(other.to_string()),
                }),
            // Plain-text bodies are only useful when short; HTML error pages are not
            Err(_) if body.len() <= 200 && !body.starts_with('<') => Some(body.to_string()),
            Err(_) => None,
        }
    }
}

/// Truncate and clamp a wire progress value into 0..=100
///
/// Fractions are floored so only a backend value of at least 100 reads as
/// complete.
pub fn clamp_progress(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    value.floor().clamp(0.0, 100.0) as u8
}
