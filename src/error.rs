//! Error types for batch submission, polling and response decoding

use std::time::Duration;
use thiserror::Error;

use crate::models::{EmptySymbolSet, UnknownStatus};

pub const GENERIC_SUBMISSION_DETAIL: &str = "Failed to start batch report generation";

/// Response body did not match any known backend shape
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed response body: {0}")]
    Malformed(String),

    #[error("response carries no job list (expected reports, results or stocks)")]
    MissingJobList,

    #[error("response carries no batch id")]
    MissingBatchId,

    #[error("job entry #{index} has no stock symbol")]
    MissingSymbol { index: usize },

    #[error("job entry for {symbol}: {source}")]
    InvalidStatus {
        symbol: String,
        #[source]
        source: UnknownStatus,
    },
}

/// Failure of a single request to the report backend
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned HTTP {status}{}", detail_suffix(.detail))]
    Status { status: u16, detail: Option<String> },

    #[error("unexpected response: {0}")]
    Decode(#[from] DecodeError),

    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {}", d)).unwrap_or_default()
}

impl ApiError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

/// Batch creation failed; surfaced to the user, never retried here
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Batch start failed: {detail}")]
pub struct SubmissionError {
    /// HTTP status when the backend answered, `None` for transport failures
    pub status: Option<u16>,
    pub detail: String,
}

impl From<ApiError> for SubmissionError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Status { status, detail } => SubmissionError {
                status: Some(status),
                detail: detail.unwrap_or_else(|| GENERIC_SUBMISSION_DETAIL.to_string()),
            },
            ApiError::Transport(e) => SubmissionError {
                status: e.status().map(|s| s.as_u16()),
                detail: GENERIC_SUBMISSION_DETAIL.to_string(),
            },
            ApiError::Decode(e) => SubmissionError {
                status: None,
                detail: format!("{} ({})", GENERIC_SUBMISSION_DETAIL, e),
            },
            ApiError::InvalidUrl(e) => SubmissionError {
                status: None,
                detail: format!("{} ({})", GENERIC_SUBMISSION_DETAIL, e),
            },
        }
    }
}

impl From<DecodeError> for SubmissionError {
    fn from(err: DecodeError) -> Self {
        ApiError::Decode(err).into()
    }
}

/// Terminal outcome of a polling loop that did not complete
#[derive(Debug, Error)]
pub enum PollingError {
    #[error("batch did not complete within {elapsed:?}")]
    Timeout { elapsed: Duration },

    #[error("giving up after {attempts} consecutive failed polls: {last_error}")]
    RetriesExhausted { attempts: usize, last_error: ApiError },

    #[error("progress response could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    #[error("polling cancelled")]
    Cancelled,
}

/// Failure of a tracked submit-poll-route run
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    EmptySymbols(#[from] EmptySymbolSet),

    #[error("select at least one report section")]
    NoSectionsSelected,

    #[error(transparent)]
    Submission(#[from] SubmissionError),

    #[error(transparent)]
    Polling(#[from] PollingError),

    #[error("tracker task ended unexpectedly: {0}")]
    Task(String),
}

impl TrackerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TrackerError::Polling(PollingError::Cancelled))
    }
}
