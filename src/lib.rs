//! Client-side tracker for bulk equity-research report batches.
//!
//! A batch is started with one `bulk_configure` request, then its progress
//! endpoint is polled until the backend reports 100%. Each poll is reconciled
//! into a [`models::Batch`] and the finished batch is turned into a
//! [`models::RoutingIntent`] for the results view.

pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;

pub use crate::core::{BatchTracker, TrackerHandle, TrackerState};
pub use crate::error::{ApiError, DecodeError, PollingError, SubmissionError, TrackerError};
