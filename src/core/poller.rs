//! Batch Progress Poller
//!
//! Fetches batch progress until the backend reports 100%. Requests are strictly
//! sequential: the next poll is only scheduled once the previous response has
//! been reconciled, so updates are applied in receipt order.

use backon::{BackoffBuilder, ConstantBackoff, ConstantBuilder};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{sleep_until, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::core::reconciler::reconcile;
use crate::core::state::TrackerState;
use crate::error::{ApiError, PollingError};
use crate::metrics::Metrics;
use crate::models::Batch;
use crate::services::reports_api::ReportsApi;
use crate::services::stock_directory::StockDirectory;

#[derive(Clone)]
pub struct BatchPoller {
    api: Arc<dyn ReportsApi>,
    directory: Arc<StockDirectory>,
    config: PollerConfig,
    metrics: Option<Arc<Metrics>>,
    state: Option<watch::Sender<TrackerState>>,
}

impl BatchPoller {
    pub fn new(api: Arc<dyn ReportsApi>, directory: Arc<StockDirectory>, config: PollerConfig) -> Self {
        Self {
            api,
            directory,
            config,
            metrics: None,
            state: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Publish `Polling` / `RetryBackoff` transitions on `state`
    pub fn with_state(mut self, state: watch::Sender<TrackerState>) -> Self {
        self.state = Some(state);
        self
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    fn retry_backoff(&self) -> ConstantBackoff {
        ConstantBuilder::default()
            .with_delay(self.config.retry_interval)
            .with_max_times(self.config.max_consecutive_failures)
            .build()
    }

    fn publish(&self, state: TrackerState) {
        if let Some(ref tx) = self.state {
            tx.send_replace(state);
        }
    }

    /// Poll `initial.batch_id` until its overall progress reaches 100.
    ///
    /// `on_update` receives every reconciled batch and is never called after
    /// `cancel` fires. Failed polls are retried after the retry interval
    /// without calling `on_update`. The loop gives up with
    /// [`PollingError::RetriesExhausted`] once more consecutive polls fail than
    /// the configured cap, and with [`PollingError::Timeout`] once the
    /// wall-clock cap elapses. No request is issued after this returns.
    pub async fn poll_until_complete<F>(
        &self,
        initial: Batch,
        mut on_update: F,
        cancel: &CancellationToken,
    ) -> Result<Batch, PollingError>
    where
        F: FnMut(&Batch) + Send,
    {
        let started = Instant::now();
        let deadline = started + self.config.max_duration;
        let batch_id = initial.batch_id.clone();
        let mut current = initial;

        if current.is_complete() {
            debug!(batch_id = %batch_id, "Batch already complete, skipping polling");
            return Ok(current);
        }

        let mut backoff = self.retry_backoff();
        let mut failures = 0usize;
        let mut delay = Duration::ZERO;

        info!(batch_id = %batch_id, interval_ms = self.config.interval.as_millis() as u64, "Polling batch progress");
        self.publish(TrackerState::Polling {
            batch_id: batch_id.clone(),
            overall_progress: current.overall_progress,
        });

        loop {
            if !delay.is_zero() {
                let wake = (Instant::now() + delay).min(deadline);
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(self.cancelled(&batch_id)),
                    _ = sleep_until(wake) => {}
                }
            }
            if cancel.is_cancelled() {
                return Err(self.cancelled(&batch_id));
            }
            if Instant::now() >= deadline {
                let elapsed = started.elapsed();
                warn!(batch_id = %batch_id, elapsed_secs = elapsed.as_secs(), "Batch polling timed out");
                return Err(PollingError::Timeout { elapsed });
            }

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(&batch_id)),
                result = self.api.bulk_progress(&batch_id) => result,
            };
            let outcome = fetched.and_then(|raw| {
                reconcile(&current, &raw, &self.directory).map_err(ApiError::Decode)
            });

            match outcome {
                Ok(next) => {
                    failures = 0;
                    backoff = self.retry_backoff();
                    current = next;
                    if let Some(ref metrics) = self.metrics {
                        metrics.batch_polls_total.inc();
                    }

                    if cancel.is_cancelled() {
                        return Err(self.cancelled(&batch_id));
                    }
                    on_update(&current);

                    debug!(
                        batch_id = %batch_id,
                        progress = current.overall_progress,
                        "Batch {} at {}%",
                        batch_id,
                        current.overall_progress
                    );
                    if current.is_complete() {
                        info!(batch_id = %batch_id, "Batch {} complete", batch_id);
                        return Ok(current);
                    }

                    self.publish(TrackerState::Polling {
                        batch_id: batch_id.clone(),
                        overall_progress: current.overall_progress,
                    });
                    delay = self.config.interval;
                }
                Err(ApiError::Decode(e)) if self.config.strict_decoding => {
                    warn!(batch_id = %batch_id, error = %e, "Unrecognised progress response");
                    if let Some(ref metrics) = self.metrics {
                        metrics.batch_poll_errors_total.inc();
                    }
                    return Err(PollingError::Decode(e));
                }
                Err(e) => {
                    failures += 1;
                    if let Some(ref metrics) = self.metrics {
                        metrics.batch_poll_errors_total.inc();
                    }

                    match backoff.next() {
                        Some(retry_in) => {
                            warn!(
                                batch_id = %batch_id,
                                attempt = failures,
                                delay_ms = retry_in.as_millis() as u64,
                                error = %e,
                                "Progress poll failed, retrying"
                            );
                            self.publish(TrackerState::RetryBackoff {
                                batch_id: batch_id.clone(),
                                attempt: failures,
                                delay: retry_in,
                            });
                            delay = retry_in;
                        }
                        None => {
                            warn!(batch_id = %batch_id, attempts = failures, error = %e, "Giving up on batch polling");
                            return Err(PollingError::RetriesExhausted {
                                attempts: failures,
                                last_error: e,
                            });
                        }
                    }
                }
            }
        }
    }

    fn cancelled(&self, batch_id: &str) -> PollingError {
        debug!(batch_id = %batch_id, "Batch polling cancelled");
        PollingError::Cancelled
    }
}
