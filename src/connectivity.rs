//! Region connectivity graph.
//!
//! Nodes are regions; an undirected edge exists wherever two regions share
//! a choke on their boundaries. The graph is tiny (tens of nodes), so path
//! queries enumerate simple paths exhaustively, with caps as a guard
//! against pathological maps.

use crate::area::*;
use crate::constants::*;
use fnv::{FnvHashMap, FnvHashSet};
use log::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ConnectivityGraph {
    /// Region -> neighboring regions, sorted, no duplicates.
    edges: FnvHashMap<AreaId, Vec<AreaId>>,
}

impl ConnectivityGraph {
    /// Builds the graph from a fully linked arena. Precondition: phase two
    /// (`link_adjacency`) has run.
    pub fn build(arena: &AreaArena) -> ConnectivityGraph {
        let mut edges: FnvHashMap<AreaId, Vec<AreaId>> = FnvHashMap::default();
        for region in arena.region_ids() {
            edges.entry(region).or_default();
            for choke in arena.get(region).region_chokes() {
                for other in &arena.get(*choke).bordering {
                    if *other != region && arena.get(*other).is_region() {
                        let list = edges.entry(region).or_default();
                        if !list.contains(other) {
                            list.push(*other);
                        }
                    }
                }
            }
        }
        for list in edges.values_mut() {
            list.sort();
        }

        let edge_count: usize = edges.values().map(|v| v.len()).sum::<usize>() / 2;
        debug!(
            "connectivity graph: {} regions, {} edges",
            edges.len(),
            edge_count
        );
        ConnectivityGraph { edges }
    }

    pub fn region_count(&self) -> usize {
        self.edges.len()
    }

    pub fn neighbors(&self, region: AreaId) -> &[AreaId] {
        self.edges.get(&region).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// True if an undirected edge joins the two regions.
    pub fn connected(&self, a: AreaId, b: AreaId) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Every simple path from `start` to `goal`, excluding any path through
    /// a region in `exclude`. Enumeration stops at
    /// [`MAX_CONNECTIVITY_PATHS`] with a logged warning.
    pub fn all_paths(
        &self,
        start: AreaId,
        goal: AreaId,
        exclude: &[AreaId],
    ) -> Vec<Vec<AreaId>> {
        let mut paths = Vec::new();
        if exclude.contains(&start) || exclude.contains(&goal) {
            return paths;
        }
        if !self.edges.contains_key(&start) || !self.edges.contains_key(&goal) {
            return paths;
        }

        let mut visited: FnvHashSet<AreaId> = FnvHashSet::default();
        let mut current = vec![start];
        visited.insert(start);
        self.dfs(start, goal, exclude, &mut visited, &mut current, &mut paths);
        if paths.len() >= MAX_CONNECTIVITY_PATHS {
            warn!(
                "path enumeration capped at {} results for {:?} -> {:?}",
                MAX_CONNECTIVITY_PATHS, start, goal
            );
        }
        paths
    }

    fn dfs(
        &self,
        node: AreaId,
        goal: AreaId,
        exclude: &[AreaId],
        visited: &mut FnvHashSet<AreaId>,
        current: &mut Vec<AreaId>,
        paths: &mut Vec<Vec<AreaId>>,
    ) {
        if paths.len() >= MAX_CONNECTIVITY_PATHS {
            return;
        }
        if node == goal {
            paths.push(current.clone());
            return;
        }
        for neighbor in self.neighbors(node).to_vec() {
            if visited.contains(&neighbor) || exclude.contains(&neighbor) {
                continue;
            }
            visited.insert(neighbor);
            current.push(neighbor);
            self.dfs(neighbor, goal, exclude, visited, current, paths);
            current.pop();
            visited.remove(&neighbor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-built graph helper: regions only, edges injected directly.
    fn graph(edges: &[(u16, u16)]) -> ConnectivityGraph {
        let mut g = ConnectivityGraph::default();
        for (a, b) in edges {
            let (a, b) = (AreaId(*a), AreaId(*b));
            g.edges.entry(a).or_default().push(b);
            g.edges.entry(b).or_default().push(a);
        }
        for list in g.edges.values_mut() {
            list.sort();
            list.dedup();
        }
        g
    }

    #[test]
    fn single_edge_yields_single_path() {
        let g = graph(&[(0, 1)]);
        let paths = g.all_paths(AreaId(0), AreaId(1), &[]);
        assert_eq!(paths, vec![vec![AreaId(0), AreaId(1)]]);
    }

    #[test]
    fn diamond_yields_both_routes() {
        // 0 - 1 - 3 and 0 - 2 - 3.
        let g = graph(&[(0, 1), (1, 3), (0, 2), (2, 3)]);
        let mut paths = g.all_paths(AreaId(0), AreaId(3), &[]);
        paths.sort();
        assert_eq!(
            paths,
            vec![
                vec![AreaId(0), AreaId(1), AreaId(3)],
                vec![AreaId(0), AreaId(2), AreaId(3)],
            ]
        );
    }

    #[test]
    fn exclusion_filters_routes() {
        let g = graph(&[(0, 1), (1, 3), (0, 2), (2, 3)]);
        let paths = g.all_paths(AreaId(0), AreaId(3), &[AreaId(1)]);
        assert_eq!(paths, vec![vec![AreaId(0), AreaId(2), AreaId(3)]]);
    }

    #[test]
    fn unreachable_goal_yields_no_paths() {
        let g = graph(&[(0, 1), (2, 3)]);
        assert!(g.all_paths(AreaId(0), AreaId(3), &[]).is_empty());
    }

    #[test]
    fn excluded_endpoint_yields_no_paths() {
        let g = graph(&[(0, 1)]);
        assert!(g.all_paths(AreaId(0), AreaId(1), &[AreaId(1)]).is_empty());
    }

    #[test]
    fn start_equals_goal_is_trivial_path() {
        let g = graph(&[(0, 1)]);
        assert_eq!(
            g.all_paths(AreaId(0), AreaId(0), &[]),
            vec![vec![AreaId(0)]]
        );
    }
}
