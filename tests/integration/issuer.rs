//! Batch submission over HTTP

use serde_json::json;
use std::sync::Arc;
use stockdesk::core::BatchIssuer;
use stockdesk::metrics::Metrics;
use stockdesk::models::{JobStatus, SectionFlags, SymbolSet};
use wiremock::matchers::{method, path};
use tokio_test::{assert_err, assert_ok};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::test_utils::{client_for, configure_response, directory, mock_configure};

#[tokio::test]
async fn submit_batch_returns_one_queued_job_per_symbol() {
    let server = MockServer::start().await;
    mock_configure(&server, configure_response("batch-7", &["AAPL", "MSFT"])).await;

    let issuer = BatchIssuer::new(Arc::new(client_for(&server)), directory());
    let symbols = SymbolSet::new(["AAPL", "MSFT"]).unwrap();

    let batch = assert_ok!(issuer.submit_batch(&symbols, SectionFlags::all()).await);

    assert_eq!(batch.batch_id, "batch-7");
    assert_eq!(batch.overall_progress, 0);
    assert_eq!(batch.jobs.len(), 2);
    assert_eq!(batch.jobs[0].symbol, "AAPL");
    assert_eq!(batch.jobs[0].display_name, "Apple Inc.");
    assert_eq!(batch.jobs[0].report_id.as_deref(), Some("1"));
    assert_eq!(batch.jobs[1].display_name, "Microsoft Corporation");
    assert!(batch.jobs.iter().all(|job| job.status == JobStatus::Queued));
}

#[tokio::test]
async fn submit_batch_keeps_immediate_partial_progress() {
    let server = MockServer::start().await;
    mock_configure(
        &server,
        json!({
            "batch_id": "fast",
            "status": "processing",
            "progress": 25,
            "reports": [
                { "stock_symbol": "AAPL", "report_id": "r1", "status": "in_progress", "progress": 50 },
                { "stock_symbol": "MSFT", "report_id": "r2", "status": "pending" }
            ]
        }),
    )
    .await;

    let issuer = BatchIssuer::new(Arc::new(client_for(&server)), directory());
    let symbols = SymbolSet::new(["AAPL", "MSFT"]).unwrap();
    let batch = issuer.submit_batch(&symbols, SectionFlags::all()).await.unwrap();

    assert_eq!(batch.overall_progress, 25);
    assert_eq!(batch.jobs[0].status, JobStatus::InProgress);
    assert_eq!(batch.jobs[0].progress, 50);
    assert_eq!(batch.jobs[1].status, JobStatus::Queued);
}

#[tokio::test]
async fn submit_batch_without_job_list_seeds_queued_jobs() {
    let server = MockServer::start().await;
    mock_configure(&server, json!({ "batch_id": "b-9", "status": "accepted" })).await;

    let issuer = BatchIssuer::new(Arc::new(client_for(&server)), directory());
    let symbols = SymbolSet::new(["aapl", "nvda"]).unwrap();
    let batch = issuer.submit_batch(&symbols, SectionFlags::all()).await.unwrap();

    let symbols: Vec<&str> = batch.jobs.iter().map(|job| job.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["AAPL", "NVDA"]);
    assert_eq!(batch.jobs[1].display_name, "NVDA");
    assert!(batch.jobs.iter().all(|job| job.report_id.is_none()));
}

#[tokio::test]
async fn submission_failure_surfaces_status_and_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/reports/bulk_configure/"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({ "error": "Report workers unavailable" })))
        .expect(1)
        .mount(&server)
        .await;

    let metrics = Arc::new(Metrics::new().unwrap());
    let issuer = BatchIssuer::new(Arc::new(client_for(&server)), directory()).with_metrics(metrics.clone());
    let symbols = SymbolSet::new(["AAPL"]).unwrap();

    let err = assert_err!(issuer.submit_batch(&symbols, SectionFlags::all()).await);
    assert_eq!(err.status, Some(503));
    assert_eq!(err.to_string(), "Batch start failed: Report workers unavailable");
    assert_eq!(metrics.batch_submission_failures_total.get(), 1);
    assert_eq!(metrics.batches_submitted_total.get(), 0);
}

#[tokio::test]
async fn submission_failure_without_body_uses_generic_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/reports/bulk_configure/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let issuer = BatchIssuer::new(Arc::new(client_for(&server)), directory());
    let symbols = SymbolSet::new(["AAPL"]).unwrap();

    let err = assert_err!(issuer.submit_batch(&symbols, SectionFlags::all()).await);
    assert_eq!(err.status, Some(500));
    assert_eq!(err.detail, "Failed to start batch report generation");
}

#[tokio::test]
async fn submission_response_without_batch_id_is_rejected() {
    let server = MockServer::start().await;
    mock_configure(&server, json!({ "status": "queued", "reports": [] })).await;

    let issuer = BatchIssuer::new(Arc::new(client_for(&server)), directory());
    let symbols = SymbolSet::new(["AAPL"]).unwrap();

    let err = assert_err!(issuer.submit_batch(&symbols, SectionFlags::all()).await);
    assert_eq!(err.status, None);
    assert!(err.detail.contains("batch id"), "detail was: {}", err.detail);
}

#[tokio::test]
async fn submission_entries_without_symbols_match_submitted_order() {
    let server = MockServer::start().await;
    mock_configure(
        &server,
        json!({
            "batch_id": "b-10",
            "status": "queued",
            "reports": [{ "id": 1, "status": "queued" }, { "id": 2, "status": "queued" }]
        }),
    )
    .await;

    let issuer = BatchIssuer::new(Arc::new(client_for(&server)), directory());
    let symbols = SymbolSet::new(["AAPL", "MSFT"]).unwrap();
    let batch = assert_ok!(issuer.submit_batch(&symbols, SectionFlags::all()).await);

    let jobs: Vec<(&str, Option<&str>)> = batch
        .jobs
        .iter()
        .map(|job| (job.symbol.as_str(), job.report_id.as_deref()))
        .collect();
    assert_eq!(jobs, vec![("AAPL", Some("1")), ("MSFT", Some("2"))]);
    assert_eq!(batch.jobs[1].display_name, "Microsoft Corporation");
}

#[tokio::test]
async fn unmatched_symbolless_entries_fall_back_to_submitted_jobs() {
    let server = MockServer::start().await;
    mock_configure(
        &server,
        json!({
            "batch_id": "b-11",
            "reports": [{ "id": 7 }, { "report_id": "r-8" }, { "id": 9 }]
        }),
    )
    .await;

    let issuer = BatchIssuer::new(Arc::new(client_for(&server)), directory());
    let symbols = SymbolSet::new(["AAPL", "MSFT"]).unwrap();
    let batch = assert_ok!(issuer.submit_batch(&symbols, SectionFlags::all()).await);

    let jobs: Vec<(&str, Option<&str>)> = batch
        .jobs
        .iter()
        .map(|job| (job.symbol.as_str(), job.report_id.as_deref()))
        .collect();
    assert_eq!(jobs, vec![("AAPL", Some("7")), ("MSFT", Some("r-8"))]);
    assert!(batch.jobs.iter().all(|job| job.status == JobStatus::Queued));
}
