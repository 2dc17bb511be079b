//! Unit tests for batch-level models

use chrono::Utc;
use stockdesk::models::{Batch, BatchJob, JobStatus, SectionFlags, SymbolSet};

#[test]
fn symbol_set_normalizes_and_deduplicates_in_order() {
    let set = SymbolSet::new(["msft", " AAPL", "MSFT", "", "nvda "]).unwrap();
    let symbols: Vec<&str> = set.iter().map(String::as_str).collect();
    assert_eq!(symbols, vec!["MSFT", "AAPL", "NVDA"]);
    assert_eq!(set.len(), 3);
}

#[test]
fn symbol_set_rejects_empty_input() {
    assert!(SymbolSet::new(Vec::<String>::new()).is_err());
    assert!(SymbolSet::new(["", "   "]).is_err());
}

#[test]
fn section_flags_from_names() {
    let flags = SectionFlags::from_names(["overview", "valuation_analysis", " thesis "]).unwrap();
    assert!(flags.company_overview);
    assert!(!flags.sector_review);
    assert!(flags.valuation);
    assert!(!flags.sentiment);
    assert!(flags.investment_thesis);
    assert!(flags.any_selected());
}

#[test]
fn section_flags_reject_unknown_names() {
    let err = SectionFlags::from_names(["overview", "charts"]).unwrap_err();
    assert_eq!(err.to_string(), "unknown report section 'charts'");
}

#[test]
fn no_sections_selected() {
    assert!(!SectionFlags::none().any_selected());
    assert!(!SectionFlags::from_names([""]).unwrap().any_selected());
    assert!(SectionFlags::default().any_selected());
}

#[test]
fn summary_counts_jobs_by_outcome() {
    let now = Utc::now();
    let mut batch = Batch::new("b", now);
    batch.jobs = vec![
        BatchJob::new("A", "A", now).with_status(JobStatus::Completed),
        BatchJob::new("B", "B", now).with_status(JobStatus::Failed),
        BatchJob::new("C", "C", now).with_status(JobStatus::InProgress),
        BatchJob::new("D", "D", now),
    ];

    let summary = batch.summary();
    assert_eq!(summary.completed, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.pending, 2);
}

#[test]
fn batch_is_complete_at_100() {
    let mut batch = Batch::new("b", Utc::now());
    assert!(!batch.is_complete());
    batch.overall_progress = 99;
    assert!(!batch.is_complete());
    batch.overall_progress = 100;
    assert!(batch.is_complete());
}
