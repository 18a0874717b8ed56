//! Time-respecting reachability over directed, time-stamped contact events.
//!
//! Contacts between identified nodes (for example, animal movements between
//! premises) are indexed per direction and time. Traversals from a root then
//! answer which nodes a disease could have reached, in how few hops, and
//! through which contact events, without ever stepping backwards in time.

pub mod cli;
pub mod query;
pub mod storage;
pub mod traversal;
pub mod types;

pub use query::{
    network_summary, shortest_paths, trace_contacts, Batch, ContactTable, ContactTrace,
    NetworkSummary, RootQueries, RootTrace, ShortestPaths,
};
pub use types::{Direction, NodeId, Result, RowId, TimeWindow, Timestamp, TraceError};
