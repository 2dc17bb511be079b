//! Batch tracking core: issue, poll, reconcile, route

pub mod issuer;
pub mod poller;
pub mod reconciler;
pub mod router;
pub mod state;
pub mod tracker;

pub use issuer::BatchIssuer;
pub use poller::BatchPoller;
pub use reconciler::reconcile;
pub use router::CompletionRouter;
pub use state::TrackerState;
pub use tracker::{BatchTracker, TrackerHandle};
