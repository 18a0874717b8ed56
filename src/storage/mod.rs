//! Contact storage: per-direction adjacency indexed by time.
//!
//! A [`ContactIndex`] is built once from a flat batch of contact rows and then
//! shared read-only by every traversal in the batch.

mod adjacency;
mod index;
mod metrics;
mod options;

/// Contact sequences and per-direction adjacency.
pub use adjacency::{Adjacency, ContactSeq};

/// Index construction.
pub use index::{ContactColumns, ContactIndex};

/// Metrics and profiling.
pub use metrics::{default_metrics, CounterMetrics, MetricsSnapshot, NoopMetrics, TraversalMetrics};

/// Index configuration options.
pub use options::IndexOptions;
