use crate::storage::ContactColumns;
use crate::types::{NodeId, Result, TimeWindow, Timestamp, TraceError};

/// Contact rows as parallel columns with one-based node ids.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ContactTable {
    /// Source node of each row.
    pub source: Vec<u32>,
    /// Destination node of each row.
    pub destination: Vec<u32>,
    /// Timestamp of each row.
    pub t: Vec<Timestamp>,
    /// One past the largest zero-based node id; valid one-based ids are `1..=number_of_identifiers`.
    pub number_of_identifiers: usize,
}

impl ContactTable {
    /// Creates an empty table sized for `number_of_identifiers` nodes.
    pub fn new(number_of_identifiers: usize) -> Self {
        Self {
            number_of_identifiers,
            ..Self::default()
        }
    }

    /// Appends one contact row.
    pub fn push(&mut self, source: u32, destination: u32, t: Timestamp) {
        self.source.push(source);
        self.destination.push(destination);
        self.t.push(t);
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.t.len()
    }

    /// Returns true when the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// Borrowed column view consumed by the index builder.
    pub fn columns(&self) -> ContactColumns<'_> {
        ContactColumns {
            source: &self.source,
            destination: &self.destination,
            t: &self.t,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.columns().row_count().map(|_| ())
    }
}

/// Per-root query parameters as parallel columns.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RootQueries {
    /// One-based root node ids.
    pub root: Vec<u32>,
    /// Start of each ingoing window.
    pub in_begin: Vec<Timestamp>,
    /// End of each ingoing window.
    pub in_end: Vec<Timestamp>,
    /// Start of each outgoing window.
    pub out_begin: Vec<Timestamp>,
    /// End of each outgoing window.
    pub out_end: Vec<Timestamp>,
}

/// A validated, zero-based view of one entry of [`RootQueries`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RootQuery {
    /// Zero-based position in the root columns.
    pub position: usize,
    /// Root node.
    pub root: NodeId,
    /// Window for the ingoing traversal.
    pub ingoing: TimeWindow,
    /// Window for the outgoing traversal.
    pub outgoing: TimeWindow,
}

impl RootQueries {
    /// Creates an empty query set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a root with separate ingoing and outgoing windows.
    pub fn push(&mut self, root: u32, ingoing: TimeWindow, outgoing: TimeWindow) {
        self.root.push(root);
        self.in_begin.push(ingoing.begin);
        self.in_end.push(ingoing.end);
        self.out_begin.push(outgoing.begin);
        self.out_end.push(outgoing.end);
    }

    /// Appends a root using the same window in both directions.
    pub fn push_symmetric(&mut self, root: u32, window: TimeWindow) {
        self.push(root, window, window);
    }

    /// Number of roots.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    /// Returns true when no root is queried.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Checks window column lengths and root id range.
    pub(crate) fn validate(&self, number_of_identifiers: usize) -> Result<()> {
        let len = self.root.len();
        for (name, column) in [
            ("in_begin", &self.in_begin),
            ("in_end", &self.in_end),
            ("out_begin", &self.out_begin),
            ("out_end", &self.out_end),
        ] {
            if column.len() != len {
                return Err(TraceError::invalid(format!(
                    "{name} has {} entries but there are {len} roots",
                    column.len()
                )));
            }
        }
        if let Some((pos, root)) = self
            .root
            .iter()
            .enumerate()
            .find(|&(_, &root)| root == 0 || root as usize > number_of_identifiers)
        {
            return Err(TraceError::invalid(format!(
                "root {root} at position {} is outside 1..={number_of_identifiers}",
                pos + 1
            )));
        }
        Ok(())
    }

    /// Zero-based queries in input order. Call only after validation.
    pub(crate) fn iter(&self) -> impl Iterator<Item = RootQuery> + '_ {
        (0..self.root.len()).map(move |i| RootQuery {
            position: i,
            root: NodeId(self.root[i] - 1),
            ingoing: TimeWindow::new(self.in_begin[i], self.in_end[i]),
            outgoing: TimeWindow::new(self.out_begin[i], self.out_end[i]),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_queries_validate_lengths() {
        let mut roots = RootQueries::new();
        roots.push_symmetric(1, TimeWindow::new(0, 5));
        assert!(roots.validate(1).is_ok());
        roots.out_end.pop();
        assert!(matches!(
            roots.validate(1),
            Err(TraceError::InvalidArgument(msg)) if msg.contains("out_end")
        ));
    }

    #[test]
    fn root_queries_validate_range() {
        let mut roots = RootQueries::new();
        roots.push_symmetric(3, TimeWindow::new(0, 5));
        assert!(roots.validate(2).is_err());
        assert!(roots.validate(3).is_ok());
        roots.push_symmetric(0, TimeWindow::new(0, 5));
        assert!(roots.validate(3).is_err());
    }

    #[test]
    fn iter_converts_to_zero_based() {
        let mut roots = RootQueries::new();
        roots.push(2, TimeWindow::new(1, 2), TimeWindow::new(3, 4));
        let q: Vec<RootQuery> = roots.iter().collect();
        assert_eq!(
            q,
            vec![RootQuery {
                position: 0,
                root: NodeId(1),
                ingoing: TimeWindow::new(1, 2),
                outgoing: TimeWindow::new(3, 4),
            }]
        );
    }

    #[test]
    fn contact_table_rejects_ragged_columns() {
        let mut table = ContactTable::new(2);
        table.push(1, 2, 3);
        assert!(table.validate().is_ok());
        table.source.push(1);
        assert!(table.validate().is_err());
    }
}
