use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use super::adjacency::Adjacency;
use super::metrics::TraversalMetrics;
use super::options::IndexOptions;
use crate::types::{Contact, Direction, NodeId, Result, RowId, Timestamp, TraceError};

/// Borrowed parallel columns of contact rows with one-based node ids.
#[derive(Clone, Copy, Debug)]
pub struct ContactColumns<'a> {
    /// Source node of each row.
    pub source: &'a [u32],
    /// Destination node of each row.
    pub destination: &'a [u32],
    /// Timestamp of each row.
    pub t: &'a [Timestamp],
}

impl<'a> ContactColumns<'a> {
    /// Number of rows, or an error when the columns disagree in length.
    pub fn row_count(&self) -> Result<usize> {
        let len = self.t.len();
        if self.source.len() != len || self.destination.len() != len {
            return Err(TraceError::invalid(format!(
                "contact columns differ in length (source {}, destination {}, t {})",
                self.source.len(),
                self.destination.len(),
                len
            )));
        }
        Ok(len)
    }
}

/// Ingoing and outgoing contact adjacency built once per query batch.
///
/// The index is read-only after [`ContactIndex::build`]; every traversal
/// borrows it immutably.
pub struct ContactIndex {
    ingoing: Adjacency,
    outgoing: Adjacency,
    events: usize,
    metrics: Arc<dyn TraversalMetrics>,
}

impl ContactIndex {
    /// Builds `ingoing[dst][src]` and `outgoing[src][dst]` from one-based columns.
    ///
    /// Rows are visited in a single stable sort by timestamp, so every
    /// contact sequence comes out ascending without a per-bucket sort and
    /// equal timestamps keep their input order.
    pub fn build(
        columns: ContactColumns<'_>,
        number_of_identifiers: usize,
        opts: &IndexOptions,
    ) -> Result<Self> {
        let started = Instant::now();
        let len = columns.row_count()?;
        if u32::try_from(len).is_err() {
            return Err(TraceError::invalid(format!(
                "{len} contact rows exceed the supported row count"
            )));
        }
        if u32::try_from(number_of_identifiers).is_err() {
            return Err(TraceError::invalid(format!(
                "number of identifiers {number_of_identifiers} is too large"
            )));
        }

        let mut order: Vec<usize> = Vec::new();
        order.try_reserve_exact(len)?;
        order.extend(0..len);
        order.sort_by_key(|&row| columns.t[row]);

        let mut ingoing = Adjacency::with_nodes(number_of_identifiers);
        let mut outgoing = Adjacency::with_nodes(number_of_identifiers);
        for row in order {
            let src = zero_based(columns.source[row], number_of_identifiers, row, "source")?;
            let dst = zero_based(
                columns.destination[row],
                number_of_identifiers,
                row,
                "destination",
            )?;
            let rowid = RowId(row as u32);
            let t = columns.t[row];
            ingoing.push(
                dst,
                Contact {
                    rowid,
                    neighbor: src,
                    t,
                },
            );
            outgoing.push(
                src,
                Contact {
                    rowid,
                    neighbor: dst,
                    t,
                },
            );
        }

        opts.metrics.index_built(len as u64);
        debug!(
            events = len,
            nodes = number_of_identifiers,
            elapsed_us = started.elapsed().as_micros() as u64,
            "contact index built"
        );
        Ok(Self {
            ingoing,
            outgoing,
            events: len,
            metrics: Arc::clone(&opts.metrics),
        })
    }

    /// Adjacency keyed by destination, neighbors are sources.
    pub fn ingoing(&self) -> &Adjacency {
        &self.ingoing
    }

    /// Adjacency keyed by source, neighbors are destinations.
    pub fn outgoing(&self) -> &Adjacency {
        &self.outgoing
    }

    /// Adjacency to follow for `direction`.
    pub fn adjacency(&self, direction: Direction) -> &Adjacency {
        match direction {
            Direction::Ingoing => &self.ingoing,
            Direction::Outgoing => &self.outgoing,
        }
    }

    /// Number of node identifiers the index was sized for.
    pub fn node_count(&self) -> usize {
        self.outgoing.node_count()
    }

    /// Number of contact rows indexed.
    pub fn event_count(&self) -> usize {
        self.events
    }

    /// Returns true when `node` lies inside the identifier range.
    pub fn contains_node(&self, node: NodeId) -> bool {
        node.index() < self.node_count()
    }

    pub(crate) fn metrics(&self) -> &dyn TraversalMetrics {
        self.metrics.as_ref()
    }
}

impl fmt::Debug for ContactIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContactIndex")
            .field("nodes", &self.node_count())
            .field("events", &self.events)
            .finish_non_exhaustive()
    }
}

fn zero_based(id: u32, number_of_identifiers: usize, row: usize, column: &str) -> Result<NodeId> {
    if id == 0 || id as usize > number_of_identifiers {
        return Err(TraceError::invalid(format!(
            "{column} id {id} in row {} is outside 1..={number_of_identifiers}",
            row + 1
        )));
    }
    Ok(NodeId(id - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(src: &[u32], dst: &[u32], t: &[Timestamp], n: usize) -> Result<ContactIndex> {
        ContactIndex::build(
            ContactColumns {
                source: src,
                destination: dst,
                t,
            },
            n,
            &IndexOptions::default(),
        )
    }

    #[test]
    fn buckets_are_keyed_oppositely() {
        let index = build(&[1, 2], &[2, 3], &[10, 20], 3).unwrap();
        let out = index.outgoing().contacts(NodeId(0), NodeId(1)).unwrap();
        assert_eq!(out.as_slice()[0].rowid, RowId(0));
        assert_eq!(out.as_slice()[0].neighbor, NodeId(1));
        let inn = index.ingoing().contacts(NodeId(2), NodeId(1)).unwrap();
        assert_eq!(inn.as_slice()[0].rowid, RowId(1));
        assert_eq!(inn.as_slice()[0].neighbor, NodeId(1));
        assert!(index.ingoing().contacts(NodeId(0), NodeId(1)).is_none());
        assert_eq!(index.event_count(), 2);
        assert_eq!(index.node_count(), 3);
    }

    #[test]
    fn sequences_sorted_with_stable_ties() {
        let index = build(&[1, 1, 1, 1], &[2, 2, 2, 2], &[9, 3, 9, 1], 2).unwrap();
        let seq = index.outgoing().contacts(NodeId(0), NodeId(1)).unwrap();
        let rows: Vec<u32> = seq.as_slice().iter().map(|c| c.rowid.0).collect();
        assert_eq!(rows, vec![3, 1, 0, 2]);
    }

    #[test]
    fn rejects_out_of_range_ids() {
        let err = build(&[1, 4], &[2, 1], &[1, 2], 3).unwrap_err();
        assert!(matches!(err, TraceError::InvalidArgument(_)));
        let err = build(&[0], &[1], &[1], 3).unwrap_err();
        assert!(matches!(err, TraceError::InvalidArgument(_)));
    }

    #[test]
    fn rejects_ragged_columns() {
        let err = build(&[1, 2], &[2], &[1, 2], 3).unwrap_err();
        assert!(matches!(err, TraceError::InvalidArgument(_)));
    }
}
