#![forbid(unsafe_code)]

//! Batch entry points over one-based contact tables.
//!
//! Each entry operation validates its arguments, builds a [`ContactIndex`]
//! once, and runs the requested traversals for every root in input order.
//! Any failure is reported as a single [`TraceError::Operation`]; no partial
//! result is ever returned.

mod input;
mod report;

use tracing::{debug, debug_span};

use crate::storage::{ContactIndex, IndexOptions};
use crate::traversal;
use crate::types::{Direction, Distance, Result, TraceError};

pub use input::{ContactTable, RootQueries, RootQuery};
pub use report::{ContactTrace, NetworkSummary, RootTrace, ShortestPaths};

const OP_SUMMARY: &str = "calculate network summary";
const OP_PATHS: &str = "calculate shortest paths";
const OP_TRACE: &str = "trace contacts";

/// A validated query batch holding the shared, read-only contact index.
#[derive(Debug)]
pub struct Batch<'a> {
    index: ContactIndex,
    roots: &'a RootQueries,
}

impl<'a> Batch<'a> {
    /// Validates the inputs and builds the contact index.
    pub fn prepare(
        contacts: &ContactTable,
        roots: &'a RootQueries,
        opts: &IndexOptions,
    ) -> Result<Self> {
        contacts.validate()?;
        roots.validate(contacts.number_of_identifiers)?;
        let index = ContactIndex::build(contacts.columns(), contacts.number_of_identifiers, opts)?;
        Ok(Self { index, roots })
    }

    /// The index shared by every traversal of the batch.
    pub fn index(&self) -> &ContactIndex {
        &self.index
    }

    /// Degree and contact chain size in both directions for every root.
    pub fn network_summary(&self) -> Result<NetworkSummary> {
        let mut summary = NetworkSummary::default();
        for q in self.roots.iter() {
            summary
                .in_degree
                .push(traversal::degree(&self.index, q.root, q.ingoing, Direction::Ingoing)?);
            summary.out_degree.push(traversal::degree(
                &self.index,
                q.root,
                q.outgoing,
                Direction::Outgoing,
            )?);
            summary.ingoing_contact_chain.push(traversal::contact_chain(
                &self.index,
                q.root,
                q.ingoing,
                Direction::Ingoing,
            )?);
            summary.outgoing_contact_chain.push(traversal::contact_chain(
                &self.index,
                q.root,
                q.outgoing,
                Direction::Outgoing,
            )?);
        }
        Ok(summary)
    }

    /// Shortest time-respecting distances from every root, one row per reached node.
    pub fn shortest_paths(&self) -> Result<ShortestPaths> {
        let mut out = ShortestPaths::default();
        for q in self.roots.iter() {
            let position = q.position as u32 + 1;
            let ingoing = traversal::shortest_paths(&self.index, q.root, q.ingoing, Direction::Ingoing)?;
            for (node, path) in ingoing {
                out.in_distance.push(path.distance);
                out.in_rowid.push(path.rowid.one_based());
                out.in_index.push(position);
                out.in_node.push(node.0 + 1);
            }
            let outgoing =
                traversal::shortest_paths(&self.index, q.root, q.outgoing, Direction::Outgoing)?;
            for (node, path) in outgoing {
                out.out_distance.push(path.distance);
                out.out_rowid.push(path.rowid.one_based());
                out.out_index.push(position);
                out.out_node.push(node.0 + 1);
            }
        }
        Ok(out)
    }

    /// Every contact on every time-respecting path from every root.
    ///
    /// `max_distance` of 0 leaves the depth unbounded.
    pub fn trace_contacts(&self, max_distance: Distance) -> Result<ContactTrace> {
        let mut trace = ContactTrace::default();
        for q in self.roots.iter() {
            let mut group = RootTrace::default();
            for c in traversal::trace_contacts(
                &self.index,
                q.root,
                q.ingoing,
                Direction::Ingoing,
                max_distance,
            )? {
                group.in_rowid.push(c.rowid.one_based());
                group.in_distance.push(c.distance);
            }
            for c in traversal::trace_contacts(
                &self.index,
                q.root,
                q.outgoing,
                Direction::Outgoing,
                max_distance,
            )? {
                group.out_rowid.push(c.rowid.one_based());
                group.out_distance.push(c.distance);
            }
            trace.groups.push(group);
        }
        Ok(trace)
    }
}

/// Network summary: in/out degree and ingoing/outgoing contact chain size per root.
pub fn network_summary(contacts: &ContactTable, roots: &RootQueries) -> Result<NetworkSummary> {
    network_summary_with(contacts, roots, &IndexOptions::default())
}

/// [`network_summary`] with explicit index options.
pub fn network_summary_with(
    contacts: &ContactTable,
    roots: &RootQueries,
    opts: &IndexOptions,
) -> Result<NetworkSummary> {
    let _span = debug_span!("network_summary", roots = roots.len()).entered();
    run(OP_SUMMARY, || {
        Batch::prepare(contacts, roots, opts)?.network_summary()
    })
}

/// Shortest paths from every root in both directions.
pub fn shortest_paths(contacts: &ContactTable, roots: &RootQueries) -> Result<ShortestPaths> {
    shortest_paths_with(contacts, roots, &IndexOptions::default())
}

/// [`shortest_paths`] with explicit index options.
pub fn shortest_paths_with(
    contacts: &ContactTable,
    roots: &RootQueries,
    opts: &IndexOptions,
) -> Result<ShortestPaths> {
    let _span = debug_span!("shortest_paths", roots = roots.len()).entered();
    run(OP_PATHS, || Batch::prepare(contacts, roots, opts)?.shortest_paths())
}

/// Contact trace from every root in both directions.
pub fn trace_contacts(
    contacts: &ContactTable,
    roots: &RootQueries,
    max_distance: Distance,
) -> Result<ContactTrace> {
    trace_contacts_with(contacts, roots, max_distance, &IndexOptions::default())
}

/// [`trace_contacts`] with explicit index options.
pub fn trace_contacts_with(
    contacts: &ContactTable,
    roots: &RootQueries,
    max_distance: Distance,
    opts: &IndexOptions,
) -> Result<ContactTrace> {
    let _span =
        debug_span!("trace_contacts", roots = roots.len(), max_distance).entered();
    run(OP_TRACE, || {
        Batch::prepare(contacts, roots, opts)?.trace_contacts(max_distance)
    })
}

fn run<T>(op: &'static str, f: impl FnOnce() -> Result<T>) -> Result<T> {
    f().map_err(|err| {
        debug!(error = %err, "{op} failed");
        TraceError::context(err, op)
    })
}
