//! Merge a polled batch status into the client-side view of the batch

use std::collections::{HashMap, HashSet};

use crate::error::DecodeError;
use crate::models::wire::{clamp_progress, RawBatchStatus};
use crate::models::{Batch, BatchJob, JobStatus};
use crate::services::stock_directory::StockDirectory;

/// Build the next [`Batch`] from `previous` and a raw backend response.
///
/// The job list is replaced wholesale by the server's list, in the server's
/// order. Per symbol, the previous job still constrains the result:
///
/// - a completed or failed job keeps its status,
/// - progress never decreases unless the job has failed,
/// - a completed job always reports 100,
/// - `created_at` and a known report id carry over.
///
/// Applying the same response twice yields the same batch.
pub fn reconcile(
    previous: &Batch,
    response: &RawBatchStatus,
    directory: &StockDirectory,
) -> Result<Batch, DecodeError> {
    let (_, entries) = response.job_entries()?;

    let known: HashMap<&str, &BatchJob> = previous
        .jobs
        .iter()
        .map(|job| (job.symbol.as_str(), job))
        .collect();
    let mut seen = HashSet::with_capacity(entries.len());
    let mut jobs = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let symbol = entry
            .resolved_symbol()
            .ok_or(DecodeError::MissingSymbol { index })?;
        // First occurrence wins for duplicated symbols
        if !seen.insert(symbol.clone()) {
            continue;
        }
        let prior = known.get(symbol.as_str()).copied();

        let mut status = match entry.status.as_deref() {
            Some(raw) => raw.parse().map_err(|source| DecodeError::InvalidStatus {
                symbol: symbol.clone(),
                source,
            })?,
            None => prior.map(|job| job.status).unwrap_or(JobStatus::Queued),
        };
        let mut progress = entry
            .progress
            .map(clamp_progress)
            .or(prior.map(|job| job.progress))
            .unwrap_or(0);

        if let Some(prior) = prior {
            if prior.status.is_terminal() {
                status = prior.status;
            }
            if status != JobStatus::Failed {
                progress = progress.max(prior.progress);
            }
        }
        if status == JobStatus::Completed {
            progress = 100;
        }

        jobs.push(BatchJob {
            display_name: directory.display_name(&symbol),
            report_id: entry
                .resolved_report_id()
                .or_else(|| prior.and_then(|job| job.report_id.clone())),
            status,
            progress,
            current_step_label: entry
                .current_step
                .as_deref()
                .map(str::trim)
                .unwrap_or_default()
                .to_string(),
            created_at: prior.map(|job| job.created_at).unwrap_or(previous.created_at),
            symbol,
        });
    }

    Ok(Batch {
        batch_id: previous.batch_id.clone(),
        overall_progress: response
            .overall_progress()
            .unwrap_or(previous.overall_progress),
        status: response.status.clone().or_else(|| previous.status.clone()),
        jobs,
        created_at: previous.created_at,
    })
}
