//! Unit tests for completion routing

use chrono::Utc;
use std::sync::Arc;
use stockdesk::core::CompletionRouter;
use stockdesk::models::{Batch, BatchJob, JobStatus, StockInfo};
use stockdesk::services::StockDirectory;

fn router() -> CompletionRouter {
    CompletionRouter::new(Arc::new(StockDirectory::from_stocks([
        StockInfo::new("AAPL", "Apple Inc.").with_sector("Technology"),
    ])))
}

fn finished_batch() -> Batch {
    let now = Utc::now();
    let mut batch = Batch::new("batch-42", now);
    batch.overall_progress = 100;
    batch.jobs = vec![
        BatchJob::new("AAPL", "Apple Inc.", now)
            .with_status(JobStatus::Completed)
            .with_progress(100),
        BatchJob::new("XYZ", "XYZ", now)
            .with_status(JobStatus::Failed)
            .with_progress(20),
    ];
    batch
}

#[test]
fn routes_to_batch_results_path_with_final_jobs() {
    let intent = router().on_batch_complete(finished_batch());

    assert_eq!(intent.batch_id, "batch-42");
    assert_eq!(intent.path, "/reports/batch/batch-42");
    assert_eq!(intent.jobs.len(), 2);
}

#[test]
fn failed_jobs_stay_visible_in_results() {
    let intent = router().on_batch_complete(finished_batch());

    assert_eq!(intent.summary.completed, 1);
    assert_eq!(intent.summary.failed, 1);
    let failed: Vec<&str> = intent.failed_jobs().map(|job| job.symbol.as_str()).collect();
    assert_eq!(failed, vec!["XYZ"]);
    assert!(!intent.all_succeeded());
}

#[test]
fn carries_stock_metadata_for_each_job() {
    let intent = router().on_batch_complete(finished_batch());

    assert_eq!(intent.stocks.len(), 2);
    assert_eq!(intent.stocks[0].sector.as_deref(), Some("Technology"));
    assert_eq!(intent.stocks[1], StockInfo::new("XYZ", "XYZ"));
}
