//! # Reachability
//!
//! Breadth-first helpers over id graphs, used for path locking and route
//! reporting on the room graph.

use std::collections::BTreeSet;
use std::hash::Hash;

/// Collects every node reachable from `start`, including `start` itself.
pub fn reachable_set<N, FN, IN>(start: N, successors: FN) -> BTreeSet<N>
where
    N: Eq + Hash + Clone + Ord,
    FN: FnMut(&N) -> IN,
    IN: IntoIterator<Item = N>,
{
    ::pathfinding::directed::bfs::bfs_reach(start, successors).collect()
}

/// Shortest hop path from `start` to `goal`, both ends included.
pub fn shortest_route<N, FN, IN>(start: &N, goal: &N, successors: FN) -> Option<Vec<N>>
where
    N: Eq + Hash + Clone,
    FN: FnMut(&N) -> IN,
    IN: IntoIterator<Item = N>,
{
    ::pathfinding::directed::bfs::bfs(start, successors, |node| node == goal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward(node: &u32) -> Vec<u32> {
        match node {
            0 => vec![1, 2],
            1 => vec![3],
            2 => vec![3],
            _ => vec![],
        }
    }

    #[test]
    fn test_reachable_set() {
        let reached = reachable_set(1, forward);
        assert_eq!(reached.into_iter().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn test_shortest_route() {
        let route = shortest_route(&0, &3, forward).unwrap();
        assert_eq!(route.len(), 3);
        assert_eq!(route.first(), Some(&0));
        assert_eq!(route.last(), Some(&3));
        assert!(shortest_route(&3, &0, forward).is_none());
    }
}
