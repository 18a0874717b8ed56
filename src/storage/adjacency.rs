use std::collections::btree_map::{self, BTreeMap};

use crate::types::{Contact, NodeId, TimeWindow, Timestamp};

/// Contacts between one (owner, neighbor) pair, ascending by timestamp.
///
/// Equal timestamps keep input order. Both bound searches rely on this order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ContactSeq {
    contacts: Vec<Contact>,
}

impl ContactSeq {
    pub(crate) fn push(&mut self, contact: Contact) {
        debug_assert!(self.contacts.last().map_or(true, |last| last.t <= contact.t));
        self.contacts.push(contact);
    }

    /// Returns the contacts in timestamp order.
    pub fn as_slice(&self) -> &[Contact] {
        &self.contacts
    }

    /// Number of contacts in the sequence.
    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    /// Returns true when the sequence holds no contact.
    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    /// Index of the first contact with `t >= begin`.
    #[inline]
    pub fn lower_bound(&self, begin: Timestamp) -> usize {
        self.contacts.partition_point(|c| c.t < begin)
    }

    /// Index one past the last contact with `t <= end`, searching from `from`.
    #[inline]
    pub fn upper_bound_from(&self, from: usize, end: Timestamp) -> usize {
        from + self.contacts[from..].partition_point(|c| c.t <= end)
    }

    /// Earliest contact inside `window`, if any.
    pub fn first_within(&self, window: TimeWindow) -> Option<&Contact> {
        self.contacts
            .get(self.lower_bound(window.begin))
            .filter(|c| c.t <= window.end)
    }

    /// All contacts inside `window`; `None` when the edge is unusable in it.
    pub fn within(&self, window: TimeWindow) -> Option<&[Contact]> {
        let lo = self.lower_bound(window.begin);
        match self.contacts.get(lo) {
            Some(first) if first.t <= window.end => {
                let hi = self.upper_bound_from(lo, window.end);
                Some(&self.contacts[lo..hi])
            }
            _ => None,
        }
    }
}

/// Per-direction adjacency: owner node to (neighbor node to contact sequence).
///
/// Neighbor maps are ordered by neighbor id, which fixes traversal order.
#[derive(Clone, Debug, Default)]
pub struct Adjacency {
    buckets: Vec<BTreeMap<NodeId, ContactSeq>>,
}

impl Adjacency {
    pub(crate) fn with_nodes(node_count: usize) -> Self {
        Self {
            buckets: vec![BTreeMap::new(); node_count],
        }
    }

    pub(crate) fn push(&mut self, owner: NodeId, contact: Contact) {
        self.buckets[owner.index()]
            .entry(contact.neighbor)
            .or_default()
            .push(contact);
    }

    /// Number of nodes the adjacency was sized for.
    pub fn node_count(&self) -> usize {
        self.buckets.len()
    }

    /// Iterates the neighbors of `owner` in ascending neighbor id order.
    ///
    /// Nodes outside the index have no neighbors.
    pub fn neighbors(&self, owner: NodeId) -> btree_map::Iter<'_, NodeId, ContactSeq> {
        static EMPTY: BTreeMap<NodeId, ContactSeq> = BTreeMap::new();
        self.buckets
            .get(owner.index())
            .unwrap_or(&EMPTY)
            .iter()
    }

    /// Contact sequence between `owner` and `neighbor`, if they ever met.
    pub fn contacts(&self, owner: NodeId, neighbor: NodeId) -> Option<&ContactSeq> {
        self.buckets.get(owner.index())?.get(&neighbor)
    }

    /// Iterates every contact sequence in the adjacency.
    pub fn sequences(&self) -> impl Iterator<Item = (NodeId, NodeId, &ContactSeq)> + '_ {
        self.buckets.iter().enumerate().flat_map(|(owner, bucket)| {
            bucket
                .iter()
                .map(move |(neighbor, seq)| (NodeId(owner as u32), *neighbor, seq))
        })
    }
}
