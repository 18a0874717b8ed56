use tracing::trace;

use super::{check_root, narrow, ChainTracker, Frame};
use crate::storage::ContactIndex;
use crate::types::{Direction, NodeId, Result, TimeWindow};

/// Number of distinct neighbors of `node` with at least one contact inside `window`.
///
/// Self loops are not counted.
pub fn degree(
    index: &ContactIndex,
    node: NodeId,
    window: TimeWindow,
    direction: Direction,
) -> Result<u32> {
    check_root(index, node)?;
    let count = index
        .adjacency(direction)
        .neighbors(node)
        .filter(|(&neighbor, seq)| neighbor != node && seq.first_within(window).is_some())
        .count();
    Ok(count as u32)
}

/// Size of the contact chain of `root`: distinct nodes reachable by time-respecting paths, root excluded.
pub fn contact_chain(
    index: &ContactIndex,
    root: NodeId,
    window: TimeWindow,
    direction: Direction,
) -> Result<u32> {
    let tracker = contact_chain_tracker(index, root, window, direction)?;
    Ok(tracker.visited_count().saturating_sub(1) as u32)
}

/// Runs the contact chain traversal and returns the final visited state.
///
/// Expansion of a neighbor is gated on [`ChainTracker::should_visit`] under
/// the expanding node's own window; the child then records its narrowed
/// window on entry.
pub fn contact_chain_tracker(
    index: &ContactIndex,
    root: NodeId,
    window: TimeWindow,
    direction: Direction,
) -> Result<ChainTracker> {
    check_root(index, root)?;
    let adj = index.adjacency(direction);
    let metrics = index.metrics();
    let mut tracker = ChainTracker::new(adj.node_count(), direction);

    tracker.update(root, window);
    metrics.node_expanded(direction);
    let mut stack = vec![Frame::new(adj, root, window, 1)];
    while let Some(frame) = stack.last_mut() {
        let Some((&neighbor, seq)) = frame.neighbors.next() else {
            stack.pop();
            continue;
        };
        if !tracker.should_visit(neighbor, frame.window) {
            continue;
        }
        let Some(hits) = seq.within(frame.window) else {
            continue;
        };
        let next = narrow(frame.window, hits, direction);
        let distance = frame.distance;
        metrics.contacts_scanned(direction, hits.len() as u64);

        tracker.update(neighbor, next);
        metrics.node_expanded(direction);
        stack.push(Frame::new(adj, neighbor, next, distance + 1));
    }

    trace!(
        root = root.0,
        direction = direction.as_str(),
        visited = tracker.visited_count(),
        "contact chain computed"
    );
    Ok(tracker)
}
