//! Completion Router: hands a finished batch to the results view

use std::sync::Arc;
use tracing::{info, warn};

use crate::models::{Batch, RoutingIntent};
use crate::services::stock_directory::StockDirectory;

pub const RESULTS_PATH_PREFIX: &str = "/reports/batch";

#[derive(Clone)]
pub struct CompletionRouter {
    directory: Arc<StockDirectory>,
}

impl CompletionRouter {
    pub fn new(directory: Arc<StockDirectory>) -> Self {
        Self { directory }
    }

    /// Build the routing intent for a completed batch.
    ///
    /// Takes the batch by value so each finished batch is routed once. A
    /// batch with failed jobs is still routed to the results view; the
    /// failures travel with the job list.
    pub fn on_batch_complete(&self, batch: Batch) -> RoutingIntent {
        let summary = batch.summary();
        let stocks = self
            .directory
            .stocks_for(batch.jobs.iter().map(|job| job.symbol.as_str()));

        if summary.failed > 0 {
            warn!(
                batch_id = %batch.batch_id,
                failed = summary.failed,
                "Batch {} finished with {} failed reports",
                batch.batch_id,
                summary.failed
            );
        }
        info!(
            batch_id = %batch.batch_id,
            completed = summary.completed,
            failed = summary.failed,
            "Routing batch {} to results",
            batch.batch_id
        );

        RoutingIntent {
            path: format!("{}/{}", RESULTS_PATH_PREFIX, batch.batch_id),
            batch_id: batch.batch_id,
            jobs: batch.jobs,
            stocks,
            summary,
        }
    }
}
