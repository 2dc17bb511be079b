//! Batch tracker: submit, poll and route one batch, with cancellation

use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, warn};

use crate::config::{PollerConfig, TrackerConfig};
use crate::core::issuer::BatchIssuer;
use crate::core::poller::BatchPoller;
use crate::core::router::CompletionRouter;
use crate::core::state::TrackerState;
use crate::error::{ApiError, PollingError, TrackerError};
use crate::metrics::Metrics;
use crate::models::{Batch, RoutingIntent, SectionFlags, SymbolSet};
use crate::services::credentials::CredentialProvider;
use crate::services::reports_api::{ReportsApi, ReportsClient};
use crate::services::stock_directory::StockDirectory;

/// Wires the issuer, poller and router together.
///
/// Holds no per-batch state; every run gets its own state channel and
/// cancellation token, so concurrent batches stay independent.
#[derive(Clone)]
pub struct BatchTracker {
    issuer: BatchIssuer,
    poller: BatchPoller,
    router: CompletionRouter,
    metrics: Option<Arc<Metrics>>,
}

impl BatchTracker {
    pub fn new(api: Arc<dyn ReportsApi>, directory: Arc<StockDirectory>, config: PollerConfig) -> Self {
        Self {
            issuer: BatchIssuer::new(api.clone(), directory.clone()),
            poller: BatchPoller::new(api, directory.clone(), config),
            router: CompletionRouter::new(directory),
            metrics: None,
        }
    }

    /// Build a tracker backed by the HTTP client described by `config`
    pub fn from_config(
        config: &TrackerConfig,
        credentials: Arc<dyn CredentialProvider>,
        directory: Arc<StockDirectory>,
    ) -> Result<Self, ApiError> {
        let client = ReportsClient::new(&config.api_url, config.request_timeout, credentials)?;
        Ok(Self::new(Arc::new(client), directory, config.poller.clone()))
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.issuer = self.issuer.with_metrics(metrics.clone());
        self.poller = self.poller.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    /// Run one batch to completion on the current task
    pub async fn run<F>(
        &self,
        symbols: Vec<String>,
        sections: SectionFlags,
        cancel: &CancellationToken,
        on_update: F,
    ) -> Result<RoutingIntent, TrackerError>
    where
        F: FnMut(&Batch) + Send,
    {
        let (state, _) = watch::channel(TrackerState::Idle);
        self.execute(symbols, sections, cancel, state, |_: &Batch| {}, on_update)
            .await
    }

    /// Spawn one batch run and return a handle to observe or cancel it.
    ///
    /// Dropping the handle cancels the run.
    pub fn start(&self, symbols: Vec<String>, sections: SectionFlags) -> TrackerHandle {
        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(TrackerState::Idle);
        let (latest_tx, latest_rx) = watch::channel(None);
        let latest_tx = Arc::new(latest_tx);
        let submitted_tx = latest_tx.clone();

        let tracker = self.clone();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            tracker
                .execute(
                    symbols,
                    sections,
                    &token,
                    state_tx,
                    move |batch: &Batch| {
                        submitted_tx.send_replace(Some(batch.clone()));
                    },
                    move |batch: &Batch| {
                        latest_tx.send_replace(Some(batch.clone()));
                    },
                )
                .await
        });

        TrackerHandle {
            cancel: cancel.clone(),
            state: state_rx,
            latest: latest_rx,
            task,
            _cancel_on_drop: cancel.drop_guard(),
        }
    }

    async fn execute<S, F>(
        &self,
        symbols: Vec<String>,
        sections: SectionFlags,
        cancel: &CancellationToken,
        state: watch::Sender<TrackerState>,
        on_submitted: S,
        on_update: F,
    ) -> Result<RoutingIntent, TrackerError>
    where
        S: FnOnce(&Batch) + Send,
        F: FnMut(&Batch) + Send,
    {
        let result = self
            .submit_and_poll(symbols, sections, cancel, &state, on_submitted, on_update)
            .await;

        match result {
            Ok(batch) => {
                let summary = batch.summary();
                if let Some(ref metrics) = self.metrics {
                    metrics.batches_completed_total.inc();
                    metrics.batch_jobs_failed_total.inc_by(summary.failed as u64);
                }
                state.send_replace(TrackerState::Completed {
                    batch_id: batch.batch_id.clone(),
                    failed_jobs: summary.failed,
                });
                Ok(self.router.on_batch_complete(batch))
            }
            Err(e) if e.is_cancelled() => {
                info!("Batch tracking cancelled");
                state.send_replace(TrackerState::Cancelled);
                Err(e)
            }
            Err(e) => {
                warn!(error = %e, "Batch tracking failed");
                state.send_replace(TrackerState::Failed {
                    reason: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn submit_and_poll<S, F>(
        &self,
        symbols: Vec<String>,
        sections: SectionFlags,
        cancel: &CancellationToken,
        state: &watch::Sender<TrackerState>,
        on_submitted: S,
        on_update: F,
    ) -> Result<Batch, TrackerError>
    where
        S: FnOnce(&Batch) + Send,
        F: FnMut(&Batch) + Send,
    {
        let symbols = SymbolSet::new(symbols)?;
        if !sections.any_selected() {
            return Err(TrackerError::NoSectionsSelected);
        }

        state.send_replace(TrackerState::Submitting);
        let batch = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PollingError::Cancelled.into()),
            submitted = self.issuer.submit_batch(&symbols, sections) => submitted?,
        };
        on_submitted(&batch);

        let poller = self.poller.clone().with_state(state.clone());
        Ok(poller.poll_until_complete(batch, on_update, cancel).await?)
    }
}

/// Handle to a spawned batch run; the run is cancelled when it is dropped
pub struct TrackerHandle {
    cancel: CancellationToken,
    state: watch::Receiver<TrackerState>,
    latest: watch::Receiver<Option<Batch>>,
    task: JoinHandle<Result<RoutingIntent, TrackerError>>,
    _cancel_on_drop: DropGuard,
}

impl TrackerHandle {
    /// Stop the run; safe to call any number of times
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn state(&self) -> TrackerState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TrackerState> {
        self.state.clone()
    }

    /// The submitted batch, then the most recent reconciled poll
    pub fn latest_batch(&self) -> Option<Batch> {
        self.latest.borrow().clone()
    }

    pub async fn join(self) -> Result<RoutingIntent, TrackerError> {
        self.task
            .await
            .map_err(|e| TrackerError::Task(e.to_string()))?
    }
}
