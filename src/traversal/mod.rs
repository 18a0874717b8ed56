#![forbid(unsafe_code)]

//! Time-respecting traversals over a [`ContactIndex`].
//!
//! Every traversal starts at a root with a time window and follows contacts
//! in one [`Direction`]. After each hop the window narrows: ingoing
//! traversals pull the window end back to the latest usable contact,
//! outgoing traversals push the window start forward to the earliest one.
//!
//! Shortest paths and contact tracing avoid cycles with a per-path
//! [`PathSet`]; contact chains use the global [`ChainTracker`]. Descents run
//! on an explicit frame stack, so depth is bounded by memory rather than the
//! call stack.

use std::collections::btree_map;

use crate::storage::{Adjacency, ContactIndex, ContactSeq};
use crate::types::{Contact, Direction, Distance, NodeId, Result, TimeWindow, TraceError};

mod chain;
mod shortest;
mod trace;
mod visited;

pub use chain::{contact_chain, degree};
pub use shortest::{shortest_paths, ShortestPath};
pub use trace::{trace_contacts, TracedContact};
pub use visited::{ChainTracker, PathSet};

/// One pending node of a depth-first descent.
struct Frame<'a> {
    node: NodeId,
    window: TimeWindow,
    /// Distance assigned to this node's neighbors.
    distance: Distance,
    neighbors: btree_map::Iter<'a, NodeId, ContactSeq>,
}

impl<'a> Frame<'a> {
    fn new(adj: &'a Adjacency, node: NodeId, window: TimeWindow, distance: Distance) -> Self {
        Self {
            node,
            window,
            distance,
            neighbors: adj.neighbors(node),
        }
    }
}

/// Window for the step after crossing `hits`, the non-empty in-window contacts of one edge.
fn narrow(window: TimeWindow, hits: &[Contact], direction: Direction) -> TimeWindow {
    match (direction, hits.first(), hits.last()) {
        (Direction::Ingoing, _, Some(last)) => TimeWindow::new(window.begin, last.t),
        (Direction::Outgoing, Some(first), _) => TimeWindow::new(first.t, window.end),
        _ => window,
    }
}

fn check_root(index: &ContactIndex, root: NodeId) -> Result<()> {
    if index.contains_node(root) {
        Ok(())
    } else {
        Err(TraceError::invalid(format!(
            "root {} is outside the {} indexed identifiers",
            root.0,
            index.node_count()
        )))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::storage::{ContactColumns, ContactIndex, IndexOptions};
    use crate::types::Timestamp;

    /// Builds an index from one-based `(source, destination, t)` rows.
    pub fn index(rows: &[(u32, u32, Timestamp)], nodes: usize) -> ContactIndex {
        let source: Vec<u32> = rows.iter().map(|r| r.0).collect();
        let destination: Vec<u32> = rows.iter().map(|r| r.1).collect();
        let t: Vec<Timestamp> = rows.iter().map(|r| r.2).collect();
        ContactIndex::build(
            ContactColumns {
                source: &source,
                destination: &destination,
                t: &t,
            },
            nodes,
            &IndexOptions::default(),
        )
        .expect("index")
    }
}
