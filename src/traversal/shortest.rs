use std::collections::BTreeMap;

use tracing::trace;

use super::{check_root, narrow, Frame, PathSet};
use crate::storage::ContactIndex;
use crate::types::{Direction, Distance, NodeId, Result, RowId, TimeWindow};

/// Fewest hops at which a node was reached and the contact that first achieved it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ShortestPath {
    /// Minimum hop count from the root.
    pub distance: Distance,
    /// Earliest in-window contact of the edge that reached the node at `distance`.
    pub rowid: RowId,
}

/// Computes the minimum time-respecting distance to every node reachable from `root`.
///
/// All loop-free paths are explored in neighbor id order, because window
/// narrowing makes reachability depend on the path taken and a plain BFS
/// would miss routes that are longer but open later edges. A node keeps the
/// first entry recorded at its minimal distance; later paths only replace it
/// when strictly shorter.
pub fn shortest_paths(
    index: &ContactIndex,
    root: NodeId,
    window: TimeWindow,
    direction: Direction,
) -> Result<BTreeMap<NodeId, ShortestPath>> {
    check_root(index, root)?;
    let adj = index.adjacency(direction);
    let metrics = index.metrics();
    let mut result: BTreeMap<NodeId, ShortestPath> = BTreeMap::new();
    let mut path = PathSet::new(adj.node_count());

    path.enter(root);
    metrics.node_expanded(direction);
    let mut stack = vec![Frame::new(adj, root, window, 1)];
    while let Some(frame) = stack.last_mut() {
        let Some((&neighbor, seq)) = frame.neighbors.next() else {
            let node = frame.node;
            path.leave(node);
            stack.pop();
            continue;
        };
        if path.contains(neighbor) {
            continue;
        }
        let Some(hits) = seq.within(frame.window) else {
            continue;
        };
        let distance = frame.distance;
        let next = narrow(frame.window, hits, direction);
        metrics.contacts_scanned(direction, hits.len() as u64);

        let candidate = ShortestPath {
            distance,
            rowid: hits[0].rowid,
        };
        result
            .entry(neighbor)
            .and_modify(|best| {
                if distance < best.distance {
                    *best = candidate;
                }
            })
            .or_insert(candidate);

        path.enter(neighbor);
        metrics.node_expanded(direction);
        stack.push(Frame::new(adj, neighbor, next, distance + 1));
    }

    trace!(
        root = root.0,
        direction = direction.as_str(),
        reached = result.len(),
        "shortest paths computed"
    );
    Ok(result)
}
