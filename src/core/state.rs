//! Observable lifecycle of one tracked batch
//!
//! ```text
//! Idle -> Submitting -> Polling -> Completed
//!                        |  ^
//!                        v  |
//!                    RetryBackoff
//! ```
//!
//! `Failed` and `Cancelled` can be entered from any non-terminal state.

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TrackerState {
    Idle,
    Submitting,
    Polling {
        batch_id: String,
        overall_progress: u8,
    },
    RetryBackoff {
        batch_id: String,
        attempt: usize,
        #[serde(with = "millis")]
        delay: Duration,
    },
    /// Batch reached 100%; individual jobs may still have failed
    Completed {
        batch_id: String,
        failed_jobs: usize,
    },
    Failed {
        reason: String,
    },
    Cancelled,
}

impl TrackerState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TrackerState::Completed { .. } | TrackerState::Failed { .. } | TrackerState::Cancelled
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            TrackerState::Idle => "idle",
            TrackerState::Submitting => "submitting",
            TrackerState::Polling { .. } => "polling",
            TrackerState::RetryBackoff { .. } => "retry_backoff",
            TrackerState::Completed { .. } => "completed",
            TrackerState::Failed { .. } => "failed",
            TrackerState::Cancelled => "cancelled",
        }
    }
}

mod millis {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(delay.as_millis() as u64)
    }
}
