//! Prometheus counters for batch tracking

use prometheus::{Encoder, IntCounter, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    pub batches_submitted_total: IntCounter,
    pub batch_submission_failures_total: IntCounter,
    pub batch_polls_total: IntCounter,
    pub batch_poll_errors_total: IntCounter,
    pub batches_completed_total: IntCounter,
    pub batch_jobs_failed_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let batches_submitted_total =
            IntCounter::new("batches_submitted_total", "Report batches accepted by the backend")?;
        let batch_submission_failures_total = IntCounter::new(
            "batch_submission_failures_total",
            "Report batch submissions that failed",
        )?;
        let batch_polls_total =
            IntCounter::new("batch_polls_total", "Successful batch progress polls")?;
        let batch_poll_errors_total =
            IntCounter::new("batch_poll_errors_total", "Failed batch progress polls")?;
        let batches_completed_total =
            IntCounter::new("batches_completed_total", "Batches that reached 100% progress")?;
        let batch_jobs_failed_total = IntCounter::new(
            "batch_jobs_failed_total",
            "Jobs reported failed in completed batches",
        )?;

        registry.register(Box::new(batches_submitted_total.clone()))?;
        registry.register(Box::new(batch_submission_failures_total.clone()))?;
        registry.register(Box::new(batch_polls_total.clone()))?;
        registry.register(Box::new(batch_poll_errors_total.clone()))?;
        registry.register(Box::new(batches_completed_total.clone()))?;
        registry.register(Box::new(batch_jobs_failed_total.clone()))?;

        Ok(Self {
            registry,
            batches_submitted_total,
            batch_submission_failures_total,
            batch_polls_total,
            batch_poll_errors_total,
            batches_completed_total,
            batch_jobs_failed_total,
        })
    }

    /// Render all counters in the Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
