//! HTTP client behaviour against a mocked backend

use serde_json::json;
use stockdesk::error::{ApiError, DecodeError};
use stockdesk::models::{BulkConfigureRequest, JobListShape, SectionFlags, SymbolSet};
use stockdesk::services::ReportsApi;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::test_utils::{client_for, configure_response, progress_response, TEST_TOKEN};

#[tokio::test]
async fn configure_bulk_posts_symbols_and_all_section_flags() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/reports/bulk_configure/"))
        .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .and(body_json(json!({
            "stock_symbols": ["AAPL", "MSFT"],
            "include_company_overview": true,
            "include_sector_review": true,
            "include_valuation_analysis": true,
            "include_sentiment_analysis": true,
            "include_investment_thesis": true,
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(configure_response("b-1", &["AAPL", "MSFT"])))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let symbols = SymbolSet::new(["AAPL", "MSFT"]).unwrap();
    let request = BulkConfigureRequest::new(&symbols, SectionFlags::all());

    let response = client.configure_bulk(&request).await.expect("submission succeeds");
    assert_eq!(response.resolved_batch_id().as_deref(), Some("b-1"));
    let (shape, entries) = response.job_entries().unwrap();
    assert_eq!(shape, JobListShape::Reports);
    assert_eq!(entries.len(), 2);
}

#[tokio::test]
async fn bulk_progress_hits_batch_progress_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports/bulk/b-42/progress/"))
        .and(header("authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(progress_response(
            "b-42",
            40,
            &[("AAPL", "in_progress", 60), ("MSFT", "completed", 100)],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let response = client.bulk_progress("b-42").await.expect("progress fetched");
    assert_eq!(response.overall_progress(), Some(40));
}

#[tokio::test]
async fn error_status_carries_backend_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/reports/bulk_configure/"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({ "detail": "Unknown symbol: ZZZZ" })))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let symbols = SymbolSet::new(["ZZZZ"]).unwrap();
    let err = client
        .configure_bulk(&BulkConfigureRequest::new(&symbols, SectionFlags::all()))
        .await
        .unwrap_err();

    match err {
        ApiError::Status { status, detail } => {
            assert_eq!(status, 400);
            assert_eq!(detail.as_deref(), Some("Unknown symbol: ZZZZ"));
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/reports/bulk/b-1/progress/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = client.bulk_progress("b-1").await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(DecodeError::Malformed(_))));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let server = MockServer::start().await;
    let client = client_for(&server);
    drop(server);

    let err = client.bulk_progress("b-1").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}
