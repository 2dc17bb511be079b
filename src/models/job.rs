//! Per-symbol report job tracked inside a batch

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle status of a single report job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and failed jobs never change status again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for a status string the backend is not known to send
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for JobStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "queued" | "pending" => Ok(JobStatus::Queued),
            "in_progress" | "processing" | "running" => Ok(JobStatus::InProgress),
            "completed" | "complete" | "done" => Ok(JobStatus::Completed),
            "failed" | "error" => Ok(JobStatus::Failed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// One unit of work for one stock symbol within a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchJob {
    pub symbol: String,
    pub display_name: String,
    /// Backend report id; absent until the backend assigns one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    pub status: JobStatus,
    pub progress: u8,
    #[serde(default)]
    pub current_step_label: String,
    pub created_at: DateTime<Utc>,
}

impl BatchJob {
    pub fn new(symbol: impl Into<String>, display_name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            symbol: symbol.into(),
            display_name: display_name.into(),
            report_id: None,
            status: JobStatus::Queued,
            progress: 0,
            current_step_label: String::new(),
            created_at,
        }
    }

    pub fn with_status(mut self, status: JobStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = progress.min(100);
        self
    }

    pub fn with_report_id(mut self, report_id: impl Into<String>) -> Self {
        self.report_id = Some(report_id.into());
        self
    }

    pub fn is_failed(&self) -> bool {
        self.status == JobStatus::Failed
    }
}
