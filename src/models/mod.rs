//! Shared data models for batch report tracking.

pub mod batch;
pub mod job;
pub mod stock;
pub mod wire;

pub use batch::{Batch, EmptySymbolSet, JobSummary, RoutingIntent, SectionFlags, SymbolSet, UnknownSection};
pub use job::{BatchJob, JobStatus, UnknownStatus};
pub use stock::StockInfo;
pub use wire::{BulkConfigureRequest, JobListShape, RawBatchStatus, RawId, RawJobEntry};
