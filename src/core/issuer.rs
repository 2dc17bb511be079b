//! Batch Request Issuer: starts a bulk report batch

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::reconciler::reconcile;
use crate::error::{DecodeError, SubmissionError};
use crate::metrics::Metrics;
use crate::models::{Batch, BatchJob, BulkConfigureRequest, RawBatchStatus, SectionFlags, SymbolSet};
use crate::services::reports_api::ReportsApi;
use crate::services::stock_directory::StockDirectory;

/// Stateless between calls; no retry is attempted on failure
#[derive(Clone)]
pub struct BatchIssuer {
    api: Arc<dyn ReportsApi>,
    directory: Arc<StockDirectory>,
    metrics: Option<Arc<Metrics>>,
}

impl BatchIssuer {
    pub fn new(api: Arc<dyn ReportsApi>, directory: Arc<StockDirectory>) -> Self {
        Self {
            api,
            directory,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Submit one batch covering `symbols` with the selected `sections`.
    ///
    /// Section selection is not validated here. The returned batch starts
    /// from the backend's immediate response: its job list when present,
    /// otherwise one queued job per submitted symbol. Entries without a
    /// symbol are matched to the submitted symbols by position.
    pub async fn submit_batch(
        &self,
        symbols: &SymbolSet,
        sections: SectionFlags,
    ) -> Result<Batch, SubmissionError> {
        let request = BulkConfigureRequest::new(symbols, sections);

        let mut response = self.api.configure_bulk(&request).await.map_err(|e| {
            error!(error = %e, symbols = ?request.stock_symbols, "Batch submission failed");
            self.record_failure();
            SubmissionError::from(e)
        })?;

        let batch_id = response.resolved_batch_id().ok_or_else(|| {
            error!("Batch submission response has no batch_id");
            self.record_failure();
            SubmissionError::from(DecodeError::MissingBatchId)
        })?;

        let created_at = Utc::now();
        let mut seed = Batch::new(batch_id, created_at);
        seed.status = response.status.clone();
        seed.jobs = symbols
            .iter()
            .map(|symbol| BatchJob::new(symbol.as_str(), self.directory.display_name(symbol), created_at))
            .collect();

        fill_submitted_symbols(&mut response, symbols);
        let mut batch = match reconcile(&seed, &response, &self.directory) {
            Ok(batch) => batch,
            Err(DecodeError::MissingJobList) => seed,
            Err(DecodeError::MissingSymbol { index }) => {
                warn!(
                    batch_id = %seed.batch_id,
                    index,
                    "Submission response entry has no symbol, keeping submitted jobs"
                );
                with_positional_ids(seed, &response)
            }
            Err(e) => {
                error!(batch_id = %seed.batch_id, error = %e, "Batch submission response could not be decoded");
                self.record_failure();
                return Err(e.into());
            }
        };
        batch.overall_progress = response.overall_progress().unwrap_or(0);

        if let Some(ref metrics) = self.metrics {
            metrics.batches_submitted_total.inc();
        }
        info!(
            batch_id = %batch.batch_id,
            jobs = batch.jobs.len(),
            "Batch {} started with {} jobs",
            batch.batch_id,
            batch.jobs.len()
        );

        Ok(batch)
    }

    fn record_failure(&self) {
        if let Some(ref metrics) = self.metrics {
            metrics.batch_submission_failures_total.inc();
        }
    }
}

/// Submission entries may omit `stock_symbol`; those take the submitted symbol
/// at the same position.
fn fill_submitted_symbols(response: &mut RawBatchStatus, symbols: &SymbolSet) {
    let Some(entries) = response.job_entries_mut() else {
        return;
    };
    for (entry, symbol) in entries.iter_mut().zip(symbols.iter()) {
        if entry.resolved_symbol().is_none() {
            entry.stock_symbol = Some(symbol.clone());
        }
    }
}

/// Seeded jobs with report ids taken from the response by position
fn with_positional_ids(mut seed: Batch, response: &RawBatchStatus) -> Batch {
    if let Ok((_, entries)) = response.job_entries() {
        for (job, entry) in seed.jobs.iter_mut().zip(entries) {
            job.report_id = entry.resolved_report_id();
        }
    }
    seed
}
