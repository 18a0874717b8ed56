use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::types::Direction;

/// Trait for tracking index construction and traversal work.
///
/// Implementations collect statistics such as how many nodes a traversal
/// expanded and how many contact events were examined. The engine never reads
/// these values back; they exist for profiling and CLI reporting.
pub trait TraversalMetrics: Send + Sync {
    /// Records that an index was built from `events` contact rows.
    fn index_built(&self, events: u64);

    /// Records a node whose neighbor buckets were scanned.
    fn node_expanded(&self, direction: Direction);

    /// Records `count` contacts that fell inside a traversal window.
    fn contacts_scanned(&self, direction: Direction, count: u64);

    /// Records `count` contact rows emitted by a contact trace.
    fn contacts_emitted(&self, count: u64);
}

/// A no-op implementation of [`TraversalMetrics`] that discards everything.
#[derive(Default)]
pub struct NoopMetrics;

impl TraversalMetrics for NoopMetrics {
    fn index_built(&self, _events: u64) {}
    fn node_expanded(&self, _direction: Direction) {}
    fn contacts_scanned(&self, _direction: Direction, _count: u64) {}
    fn contacts_emitted(&self, _count: u64) {}
}

/// A thread-safe counter-based implementation of [`TraversalMetrics`].
#[derive(Default, Debug)]
pub struct CounterMetrics {
    /// Number of indexes built.
    pub indexes_built: AtomicU64,

    /// Total contact rows indexed.
    pub events_indexed: AtomicU64,

    /// Nodes expanded by ingoing traversals.
    pub nodes_expanded_in: AtomicU64,

    /// Nodes expanded by outgoing traversals.
    pub nodes_expanded_out: AtomicU64,

    /// In-window contacts examined by ingoing traversals.
    pub contacts_scanned_in: AtomicU64,

    /// In-window contacts examined by outgoing traversals.
    pub contacts_scanned_out: AtomicU64,

    /// Contact rows emitted by contact traces.
    pub contacts_emitted: AtomicU64,
}

impl CounterMetrics {
    /// Returns a plain snapshot of the counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            indexes_built: self.indexes_built.load(Ordering::Relaxed),
            events_indexed: self.events_indexed.load(Ordering::Relaxed),
            nodes_expanded_in: self.nodes_expanded_in.load(Ordering::Relaxed),
            nodes_expanded_out: self.nodes_expanded_out.load(Ordering::Relaxed),
            contacts_scanned_in: self.contacts_scanned_in.load(Ordering::Relaxed),
            contacts_scanned_out: self.contacts_scanned_out.load(Ordering::Relaxed),
            contacts_emitted: self.contacts_emitted.load(Ordering::Relaxed),
        }
    }
}

impl TraversalMetrics for CounterMetrics {
    fn index_built(&self, events: u64) {
        self.indexes_built.fetch_add(1, Ordering::Relaxed);
        self.events_indexed.fetch_add(events, Ordering::Relaxed);
    }

    fn node_expanded(&self, direction: Direction) {
        match direction {
            Direction::Ingoing => {
                self.nodes_expanded_in.fetch_add(1, Ordering::Relaxed);
            }
            Direction::Outgoing => {
                self.nodes_expanded_out.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn contacts_scanned(&self, direction: Direction, count: u64) {
        match direction {
            Direction::Ingoing => {
                self.contacts_scanned_in.fetch_add(count, Ordering::Relaxed);
            }
            Direction::Outgoing => {
                self.contacts_scanned_out.fetch_add(count, Ordering::Relaxed);
            }
        }
    }

    fn contacts_emitted(&self, count: u64) {
        self.contacts_emitted.fetch_add(count, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`CounterMetrics`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of indexes built.
    pub indexes_built: u64,
    /// Total contact rows indexed.
    pub events_indexed: u64,
    /// Nodes expanded by ingoing traversals.
    pub nodes_expanded_in: u64,
    /// Nodes expanded by outgoing traversals.
    pub nodes_expanded_out: u64,
    /// In-window contacts examined by ingoing traversals.
    pub contacts_scanned_in: u64,
    /// In-window contacts examined by outgoing traversals.
    pub contacts_scanned_out: u64,
    /// Contact rows emitted by contact traces.
    pub contacts_emitted: u64,
}

/// Returns the default metrics implementation wrapped in an [`Arc`].
///
/// The default implementation is [`NoopMetrics`].
pub fn default_metrics() -> Arc<dyn TraversalMetrics> {
    Arc::new(NoopMetrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate_per_direction() {
        let metrics = CounterMetrics::default();
        metrics.index_built(4);
        metrics.node_expanded(Direction::Ingoing);
        metrics.node_expanded(Direction::Outgoing);
        metrics.node_expanded(Direction::Outgoing);
        metrics.contacts_scanned(Direction::Outgoing, 3);
        metrics.contacts_emitted(2);

        let snap = metrics.snapshot();
        assert_eq!(snap.indexes_built, 1);
        assert_eq!(snap.events_indexed, 4);
        assert_eq!(snap.nodes_expanded_in, 1);
        assert_eq!(snap.nodes_expanded_out, 2);
        assert_eq!(snap.contacts_scanned_in, 0);
        assert_eq!(snap.contacts_scanned_out, 3);
        assert_eq!(snap.contacts_emitted, 2);
    }
}
