//! Stockdesk batch report runner
//!
//! Starts a bulk report batch for the given symbols and follows it until the
//! backend reports completion. Ctrl-C stops polling.
//!
//! Symbols come from the command line or `SYMBOLS`; sections from `SECTIONS`
//! (`overview,sector,valuation,sentiment,thesis`, default all); company names
//! from the JSON stock list at `STOCK_LIST`.

use dotenvy::dotenv;
use std::env;
use std::sync::Arc;
use stockdesk::config::TrackerConfig;
use stockdesk::logging;
use stockdesk::metrics::Metrics;
use stockdesk::models::{RoutingIntent, SectionFlags};
use stockdesk::services::{EnvCredentials, StockDirectory};
use stockdesk::{BatchTracker, TrackerState};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let mut symbols: Vec<String> = env::args().skip(1).collect();
    if symbols.is_empty() {
        symbols = env::var("SYMBOLS")
            .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
            .unwrap_or_default();
    }

    let sections = match env::var("SECTIONS") {
        Ok(names) => SectionFlags::from_names(names.split(','))?,
        Err(_) => SectionFlags::all(),
    };

    let directory = match env::var("STOCK_LIST") {
        Ok(path) => {
            let directory = StockDirectory::from_json_file(&path)?;
            info!(path = %path, stocks = directory.len(), "Loaded stock list");
            directory
        }
        Err(_) => StockDirectory::new(),
    };

    let config = TrackerConfig::from_env();
    let env = stockdesk::config::get_environment();
    info!("Starting Stockdesk batch report");
    info!(environment = %env, api_url = %config.api_url, "Environment");

    let metrics = Arc::new(Metrics::new()?);
    let tracker = BatchTracker::from_config(
        &config,
        Arc::new(EnvCredentials::default()),
        Arc::new(directory),
    )?
    .with_metrics(metrics.clone());

    let handle = tracker.start(symbols, sections);
    let mut state = handle.subscribe();

    // Progress reporting until the run settles or Ctrl-C is pressed
    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = state.borrow_and_update().clone();
                match &current {
                    TrackerState::Polling { batch_id, overall_progress } => {
                        info!(batch_id = %batch_id, progress = overall_progress, "Batch {} at {}%", batch_id, overall_progress);
                    }
                    TrackerState::RetryBackoff { batch_id, attempt, delay } => {
                        warn!(batch_id = %batch_id, attempt = attempt, "Progress unavailable, retrying in {:?}", delay);
                    }
                    other => info!(state = other.name(), "Tracker state changed"),
                }
                if current.is_terminal() {
                    break;
                }
            }
            _ = signal::ctrl_c() => {
                info!("Cancelling batch polling...");
                handle.cancel();
                break;
            }
        }
    }

    match handle.join().await {
        Ok(intent) => {
            print_results(&intent);
            if let Ok(text) = metrics.export() {
                tracing::debug!(metrics = %text, "Final metrics");
            }
            Ok(())
        }
        Err(e) if e.is_cancelled() => {
            info!("Batch polling stopped; the backend keeps generating the reports");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Batch report run failed");
            Err(e.into())
        }
    }
}

fn print_results(intent: &RoutingIntent) {
    println!("Batch {} finished ({})", intent.batch_id, intent.path);
    println!(
        "  completed: {}  failed: {}  pending: {}",
        intent.summary.completed, intent.summary.failed, intent.summary.pending
    );
    for job in &intent.jobs {
        println!(
            "  {:<8} {:<32} {:<12} {:>3}%  {}",
            job.symbol,
            job.display_name,
            job.status.as_str(),
            job.progress,
            job.report_id.as_deref().unwrap_or("-")
        );
    }
}
