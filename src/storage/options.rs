use std::fmt;
use std::sync::Arc;

use super::metrics::{default_metrics, TraversalMetrics};

/// Configuration supplied when building a [`super::ContactIndex`].
#[derive(Clone)]
pub struct IndexOptions {
    /// Metrics sink shared by the index and every traversal over it.
    pub metrics: Arc<dyn TraversalMetrics>,
}

impl IndexOptions {
    /// Creates options with the no-op metrics sink.
    pub fn new() -> Self {
        Self {
            metrics: default_metrics(),
        }
    }

    /// Sets the metrics sink.
    pub fn metrics(mut self, metrics: Arc<dyn TraversalMetrics>) -> Self {
        self.metrics = metrics;
        self
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for IndexOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexOptions").finish_non_exhaustive()
    }
}
