#![forbid(unsafe_code)]

//! Core identifiers, time windows and the crate-wide error type.
//!
//! All identifiers in this module are zero-based. Conversion from and to the
//! one-based values exchanged with callers happens in [`crate::query`].

use std::collections::TryReserveError;
use std::fmt;

use thiserror::Error;

/// Integer time of a contact event (for dates: days since 1970-01-01).
pub type Timestamp = i64;

/// Hop count from the root of a traversal; direct neighbors are at distance 1.
pub type Distance = u32;

/// Zero-based node identifier in `[0, numberOfIdentifiers)`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct NodeId(pub u32);

/// Zero-based reference back to the input row a contact was built from.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub struct RowId(pub u32);

impl NodeId {
    /// Returns the identifier as a vector index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl RowId {
    /// Returns the one-based row number used outside the engine.
    #[inline]
    pub fn one_based(self) -> u32 {
        self.0 + 1
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(value: u32) -> Self {
        NodeId(value)
    }
}

impl From<NodeId> for u32 {
    fn from(value: NodeId) -> Self {
        value.0
    }
}

/// Direction of edge following during a traversal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Direction {
    /// Follows destination to source edges, narrowing the window end backward in time.
    Ingoing,
    /// Follows source to destination edges, advancing the window start forward in time.
    Outgoing,
}

impl Direction {
    /// Short label used in logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ingoing => "in",
            Direction::Outgoing => "out",
        }
    }

    /// Returns true for [`Direction::Ingoing`].
    #[inline]
    pub fn is_ingoing(self) -> bool {
        matches!(self, Direction::Ingoing)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive time bound `[begin, end]` restricting which contacts a traversal step may use.
///
/// A window with `begin > end` is accepted and simply admits no contact.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct TimeWindow {
    /// First admissible timestamp.
    pub begin: Timestamp,
    /// Last admissible timestamp.
    pub end: Timestamp,
}

impl TimeWindow {
    /// Creates a window spanning `[begin, end]`.
    pub const fn new(begin: Timestamp, end: Timestamp) -> Self {
        Self { begin, end }
    }

    /// Returns true when no timestamp can fall inside the window.
    pub fn is_empty(&self) -> bool {
        self.begin > self.end
    }

    /// Returns true when `t` lies within the window.
    pub fn contains(&self, t: Timestamp) -> bool {
        self.begin <= t && t <= self.end
    }

    /// Returns true when `self` admits every timestamp `other` admits.
    pub fn covers(&self, other: &TimeWindow) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }
}

/// Immutable contact event stored in an adjacency bucket.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Contact {
    /// Input row this contact came from.
    pub rowid: RowId,
    /// Node at the other end of the edge relative to the owning bucket.
    pub neighbor: NodeId,
    /// Time of the event.
    pub t: Timestamp,
}

/// Error type shared by index construction and the query entry points.
#[derive(Error, Debug)]
pub enum TraceError {
    /// Required input was missing, inconsistent or out of range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// Scratch memory for index construction could not be obtained.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
    /// Failure of a whole entry operation, reported under a single generic message.
    #[error("unable to {op}")]
    Operation {
        /// Entry operation that failed.
        op: &'static str,
        /// Underlying cause.
        #[source]
        source: Box<TraceError>,
    },
}

impl TraceError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        TraceError::InvalidArgument(message.into())
    }

    /// Wraps `self` as the failure of entry operation `op`.
    pub fn context(self, op: &'static str) -> Self {
        match self {
            already @ TraceError::Operation { .. } => already,
            other => TraceError::Operation {
                op,
                source: Box::new(other),
            },
        }
    }

    /// Returns the innermost cause, skipping operation wrappers.
    pub fn root_cause(&self) -> &TraceError {
        match self {
            TraceError::Operation { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_contains_is_inclusive() {
        let w = TimeWindow::new(5, 10);
        assert!(w.contains(5));
        assert!(w.contains(10));
        assert!(!w.contains(4));
        assert!(!w.contains(11));
        assert!(!w.is_empty());
        assert!(TimeWindow::new(3, 2).is_empty());
    }

    #[test]
    fn window_covers() {
        assert!(TimeWindow::new(0, 10).covers(&TimeWindow::new(2, 8)));
        assert!(!TimeWindow::new(3, 10).covers(&TimeWindow::new(2, 8)));
    }

    #[test]
    fn context_wraps_once() {
        let err = TraceError::invalid("root 0 out of range")
            .context("trace contacts")
            .context("calculate shortest paths");
        assert_eq!(err.to_string(), "unable to trace contacts");
        assert!(matches!(err.root_cause(), TraceError::InvalidArgument(_)));
    }

    #[test]
    fn rowid_one_based() {
        assert_eq!(RowId(0).one_based(), 1);
        assert_eq!(NodeId(7).index(), 7);
    }
}
