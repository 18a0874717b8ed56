use tracing::trace;

use super::{check_root, narrow, Frame, PathSet};
use crate::storage::ContactIndex;
use crate::types::{Direction, Distance, NodeId, Result, RowId, TimeWindow};

/// One contact event met during a trace, tagged with its hop distance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TracedContact {
    /// Row of the contact.
    pub rowid: RowId,
    /// Hop distance from the root at which the contact was crossed.
    pub distance: Distance,
}

/// Collects every contact on every loop-free time-respecting path from `root`.
///
/// Each usable edge emits all of its in-window contacts at the current
/// distance. With `max_distance > 0` the descent stops below that depth;
/// contacts at the cutoff depth are still emitted. A contact reachable along
/// several paths is emitted once per path.
pub fn trace_contacts(
    index: &ContactIndex,
    root: NodeId,
    window: TimeWindow,
    direction: Direction,
    max_distance: Distance,
) -> Result<Vec<TracedContact>> {
    check_root(index, root)?;
    let adj = index.adjacency(direction);
    let metrics = index.metrics();
    let mut result: Vec<TracedContact> = Vec::new();
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
        metrics.contacts_emitted(hits.len() as u64);
        result.extend(hits.iter().map(|c| TracedContact {
            rowid: c.rowid,
            distance,
        }));

        if max_distance > 0 && distance >= max_distance {
            continue;
        }
        path.enter(neighbor);
        metrics.node_expanded(direction);
        stack.push(Frame::new(adj, neighbor, next, distance + 1));
    }

    trace!(
        root = root.0,
        direction = direction.as_str(),
        contacts = result.len(),
        "contacts traced"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traversal::test_support::index;

    fn rows(traced: &[TracedContact]) -> Vec<(u32, Distance)> {
        traced.iter().map(|c| (c.rowid.0, c.distance)).collect()
    }

    #[test]
    fn duplicate_contacts_are_all_emitted() {
        let idx = index(&[(1, 2, 5), (1, 2, 7)], 2);
        let out =
            trace_contacts(&idx, NodeId(0), TimeWindow::new(0, 10), Direction::Outgoing, 0)
                .unwrap();
        assert_eq!(rows(&out), vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn window_excludes_late_hop() {
        let idx = index(&[(1, 2, 10), (2, 3, 20)], 3);
        let out =
            trace_contacts(&idx, NodeId(0), TimeWindow::new(0, 15), Direction::Outgoing, 0)
                .unwrap();
        assert_eq!(rows(&out), vec![(0, 1)]);
    }

    #[test]
    fn max_distance_cuts_descent_after_emitting() {
        let idx = index(&[(1, 2, 1), (1, 2, 2), (2, 3, 3), (3, 4, 4)], 4);
        let window = TimeWindow::new(0, 10);
        let full = trace_contacts(&idx, NodeId(0), window, Direction::Outgoing, 0).unwrap();
        assert_eq!(rows(&full), vec![(0, 1), (1, 1), (2, 2), (3, 3)]);
        let cut = trace_contacts(&idx, NodeId(0), window, Direction::Outgoing, 2).unwrap();
        assert_eq!(rows(&cut), vec![(0, 1), (1, 1), (2, 2)]);
        let one = trace_contacts(&idx, NodeId(0), window, Direction::Outgoing, 1).unwrap();
        assert_eq!(rows(&one), vec![(0, 1), (1, 1)]);
    }

    #[test]
    fn ingoing_trace_uses_narrowed_end() {
        // Into 3: 2 -> 3 at 5 and 8; upstream 1 -> 2 at 7 qualifies (<= 8), 4 -> 2 at 9 does not.
        let idx = index(&[(2, 3, 5), (2, 3, 8), (1, 2, 7), (4, 2, 9)], 4);
        let out =
            trace_contacts(&idx, NodeId(2), TimeWindow::new(0, 10), Direction::Ingoing, 0)
                .unwrap();
        assert_eq!(rows(&out), vec![(0, 1), (1, 1), (2, 2)]);
    }

    #[test]
    fn contact_reached_on_two_paths_is_emitted_twice() {
        let idx = index(&[(1, 2, 1), (1, 3, 1), (2, 4, 2), (3, 4, 2), (4, 5, 3)], 5);
        let out =
            trace_contacts(&idx, NodeId(0), TimeWindow::new(0, 10), Direction::Outgoing, 0)
                .unwrap();
        let last_hop: Vec<_> = out.iter().filter(|c| c.rowid == RowId(4)).collect();
        assert_eq!(last_hop.len(), 2);
        assert!(last_hop.iter().all(|c| c.distance == 3));
    }
}
