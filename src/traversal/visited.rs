use crate::types::{Direction, NodeId, TimeWindow, Timestamp};

/// Nodes on the current root-to-leaf path of a depth-first descent.
///
/// A node is entered when the descent reaches it and left when all of its
/// neighbors are exhausted, so sibling branches never see each other's visits.
#[derive(Clone, Debug)]
pub struct PathSet {
    on_path: Vec<bool>,
    depth: usize,
}

impl PathSet {
    /// Creates an empty path over `node_count` identifiers.
    pub fn new(node_count: usize) -> Self {
        Self {
            on_path: vec![false; node_count],
            depth: 0,
        }
    }

    /// Pushes `node` onto the path.
    pub fn enter(&mut self, node: NodeId) {
        let slot = &mut self.on_path[node.index()];
        debug_assert!(!*slot, "node {node} entered twice on one path");
        *slot = true;
        self.depth += 1;
    }

    /// Pops `node` off the path.
    pub fn leave(&mut self, node: NodeId) {
        let slot = &mut self.on_path[node.index()];
        debug_assert!(*slot, "node {node} left without being entered");
        *slot = false;
        self.depth -= 1;
    }

    /// Returns true when `node` is on the current path.
    pub fn contains(&self, node: NodeId) -> bool {
        self.on_path.get(node.index()).copied().unwrap_or(false)
    }

    /// Number of nodes on the current path.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Global per-node record of the most permissive window edge reached so far.
///
/// The boundary is the window end for ingoing traversals and the window
/// start for outgoing ones. A node is re-expanded only when a new window
/// strictly extends its boundary, and boundaries only move toward one limit,
/// which bounds the total work.
#[derive(Clone, Debug)]
pub struct ChainTracker {
    boundary: Vec<Option<Timestamp>>,
    visited: usize,
    direction: Direction,
}

impl ChainTracker {
    /// Creates a tracker with every node unvisited.
    pub fn new(node_count: usize, direction: Direction) -> Self {
        Self {
            boundary: vec![None; node_count],
            visited: 0,
            direction,
        }
    }

    /// Marks `node` visited under `window`, extending its boundary if the window is more permissive.
    pub fn update(&mut self, node: NodeId, window: TimeWindow) {
        let edge = self.edge(window);
        let idx = node.index();
        match self.boundary[idx] {
            Some(current) => {
                let extends = match self.direction {
                    Direction::Ingoing => edge > current,
                    Direction::Outgoing => edge < current,
                };
                if extends {
                    self.boundary[idx] = Some(edge);
                }
            }
            None => {
                self.boundary[idx] = Some(edge);
                self.visited += 1;
            }
        }
    }

    /// Returns true when expanding `node` under `window` could unlock new contacts.
    pub fn should_visit(&self, node: NodeId, window: TimeWindow) -> bool {
        match self.boundary[node.index()] {
            None => true,
            Some(current) => match self.direction {
                Direction::Ingoing => window.end > current,
                Direction::Outgoing => window.begin < current,
            },
        }
    }

    /// Recorded boundary of `node`, `None` while unvisited.
    pub fn boundary(&self, node: NodeId) -> Option<Timestamp> {
        self.boundary.get(node.index()).copied().flatten()
    }

    /// Number of distinct nodes visited, including the root.
    pub fn visited_count(&self) -> usize {
        self.visited
    }

    /// Visited nodes in ascending id order.
    pub fn visited_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.boundary
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_some())
            .map(|(i, _)| NodeId(i as u32))
    }

    fn edge(&self, window: TimeWindow) -> Timestamp {
        match self.direction {
            Direction::Ingoing => window.end,
            Direction::Outgoing => window.begin,
        }
    }
}
