//! Per-call adjacency over a node/edge snapshot.
//!
//! `NavGraph` borrows the caller's nodes and indexes them densely so the
//! searches can work on `usize` handles and flat `Vec`s.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::model::{Edge, Node, NodeId, Route};
use crate::Result;
use super::SearchLimits;

/// Directed, weighted half-edge.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Link {
    pub to: usize,
    pub cost: f64,
}

/// Frontier entry shared by A* and Dijkstra.
///
/// Ordered so that `BinaryHeap` pops the lowest `priority` first, breaking
/// ties by insertion order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Frontier {
    pub priority: f64,
    pub g: f64,
    pub node: usize,
    pub seq: u64,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Navigable graph built from a snapshot.
#[derive(Debug)]
pub struct NavGraph<'a> {
    nodes: Vec<&'a Node>,
    index: HashMap<&'a NodeId, usize>,
    adjacency: Vec<SmallVec<[Link; 4]>>,
    pixels_per_meter: f64,
}

impl<'a> NavGraph<'a> {
    /// Build adjacency from every node in `nodes`.
    pub fn build(
        nodes: &'a [Node],
        edges: &[Edge],
        accessible_only: bool,
        pixels_per_meter: f64,
    ) -> Self {
        Self::build_filtered(nodes, edges, accessible_only, pixels_per_meter, |_| true)
    }

    /// Build adjacency from the nodes accepted by `keep`.
    ///
    /// With `accessible_only`, inaccessible nodes and edges are removed before
    /// adjacency is built. Edges with a missing endpoint are dropped silently;
    /// self-edges and edges with a negative or non-finite cost are dropped
    /// with a warning.
    pub fn build_filtered(
        nodes: &'a [Node],
        edges: &[Edge],
        accessible_only: bool,
        pixels_per_meter: f64,
        keep: impl Fn(&Node) -> bool,
    ) -> Self {
        let mut kept: Vec<&'a Node> = Vec::new();
        let mut index: HashMap<&'a NodeId, usize> = HashMap::new();
        for node in nodes {
            if (accessible_only && !node.accessible) || !keep(node) {
                continue;
            }
            if index.contains_key(&node.id) {
                warn!(node = %node.id, "duplicate node id in snapshot, keeping first");
                continue;
            }
            index.insert(&node.id, kept.len());
            kept.push(node);
        }

        let mut adjacency: Vec<SmallVec<[Link; 4]>> = vec![SmallVec::new(); kept.len()];
        let mut dropped = 0usize;
        for edge in edges {
            if accessible_only && !edge.accessible {
                continue;
            }
            let (Some(&from), Some(&to)) = (index.get(&edge.from_node), index.get(&edge.to_node)) else {
                dropped += 1;
                continue;
            };
            let Some(cost) = edge.cost() else {
                warn!(edge = %edge.id, "dropping self-edge or edge with invalid cost");
                continue;
            };
            adjacency[from].push(Link { to, cost });
            if edge.bidirectional {
                adjacency[to].push(Link { to: from, cost });
            }
        }
        if dropped > 0 {
            trace!(dropped, "edges without both endpoints in node set ignored");
        }

        Self { nodes: kept, index, adjacency, pixels_per_meter }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn node(&self, idx: usize) -> &'a Node {
        self.nodes[idx]
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub(crate) fn links(&self, idx: usize) -> &[Link] {
        &self.adjacency[idx]
    }

    /// Straight-line distance in meters. Zero when the scale is unusable,
    /// which degrades A* to Dijkstra rather than mis-guiding it.
    pub fn heuristic(&self, from: usize, to: usize) -> f64 {
        if !(self.pixels_per_meter.is_finite() && self.pixels_per_meter > 0.0) {
            return 0.0;
        }
        self.nodes[from].pixel_distance(self.nodes[to]) / self.pixels_per_meter
    }

    /// Materialise a `Route` from a dense index path.
    pub(crate) fn route_from(&self, path: &[usize], total_distance_m: f64) -> Route {
        let nodes: Vec<Node> = path.iter().map(|&i| self.nodes[i].clone()).collect();
        Route {
            ordered_node_ids: nodes.iter().map(|n| n.id.clone()).collect(),
            nodes,
            total_distance_m,
        }
    }

    /// Single-source Dijkstra over the whole graph.
    pub fn shortest_path_tree(&self, source: usize, limits: &SearchLimits) -> Result<ShortestPathTree> {
        let n = self.len();
        let mut dist = vec![f64::INFINITY; n];
        let mut prev: Vec<Option<usize>> = vec![None; n];
        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;
        let mut expanded = 0usize;

        dist[source] = 0.0;
        heap.push(Frontier { priority: 0.0, g: 0.0, node: source, seq });

        while let Some(current) = heap.pop() {
            if current.g > dist[current.node] {
                continue;
            }
            expanded += 1;
            limits.check(expanded)?;

            for link in self.links(current.node) {
                let tentative = current.g + link.cost;
                if tentative < dist[link.to] {
                    dist[link.to] = tentative;
                    prev[link.to] = Some(current.node);
                    seq += 1;
                    heap.push(Frontier { priority: tentative, g: tentative, node: link.to, seq });
                }
            }
        }

        trace!(source = %self.nodes[source].id, expanded, "shortest path tree built");
        Ok(ShortestPathTree { dist, prev })
    }
}

/// Result of a single-source search: distances and predecessor links.
#[derive(Debug, Clone)]
pub struct ShortestPathTree {
    dist: Vec<f64>,
    prev: Vec<Option<usize>>,
}

impl ShortestPathTree {
    /// Distance to `target`, or `None` if unreachable.
    pub fn distance_to(&self, target: usize) -> Option<f64> {
        self.dist.get(target).copied().filter(|d| d.is_finite())
    }

    /// Dense index path from the source to `target`, inclusive.
    pub fn path_to(&self, target: usize) -> Option<Vec<usize>> {
        self.distance_to(target)?;
        let mut path = vec![target];
        let mut current = target;
        while let Some(p) = self.prev[current] {
            path.push(p);
            current = p;
        }
        path.reverse();
        Some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line() -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            Node::new("a", "f1", 0.0, 0.0),
            Node::new("b", "f1", 10.0, 0.0).with_accessible(false),
            Node::new("c", "f1", 20.0, 0.0),
        ];
        let edges = vec![
            Edge::new("ab", "a", "b", 1.0),
            Edge::new("bc", "b", "c", 1.0).one_way(),
            Edge::new("ghost", "a", "zz", 1.0),
            Edge::new("loop", "a", "a", 1.0),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_build_respects_direction() {
        let (nodes, edges) = line();
        let g = NavGraph::build(&nodes, &edges, false, 10.0);
        let b = g.index_of(&"b".into()).unwrap();
        let c = g.index_of(&"c".into()).unwrap();
        assert!(g.links(b).iter().any(|l| l.to == c));
        assert!(g.links(c).is_empty());
    }

    #[test]
    fn test_build_drops_missing_endpoints_and_self_edges() {
        let (nodes, edges) = line();
        let g = NavGraph::build(&nodes, &edges, false, 10.0);
        let a = g.index_of(&"a".into()).unwrap();
        assert_eq!(g.links(a).len(), 1);
    }

    #[test]
    fn test_accessible_only_removes_nodes() {
        let (nodes, edges) = line();
        let g = NavGraph::build(&nodes, &edges, true, 10.0);
        assert_eq!(g.len(), 2);
        assert!(!g.contains(&"b".into()));
    }

    #[test]
    fn test_shortest_path_tree() {
        let (nodes, edges) = line();
        let g = NavGraph::build(&nodes, &edges, false, 10.0);
        let a = g.index_of(&"a".into()).unwrap();
        let c = g.index_of(&"c".into()).unwrap();
        let tree = g.shortest_path_tree(a, &SearchLimits::default()).unwrap();
        assert_eq!(tree.distance_to(c), Some(2.0));
        assert_eq!(tree.path_to(c).unwrap().len(), 3);

        let back = g.shortest_path_tree(c, &SearchLimits::default()).unwrap();
        assert_eq!(back.distance_to(a), None);
    }

    #[test]
    fn test_heuristic_zero_for_bad_scale() {
        let (nodes, edges) = line();
        let g = NavGraph::build(&nodes, &edges, false, 0.0);
        assert_eq!(g.heuristic(0, 2), 0.0);
    }
}
