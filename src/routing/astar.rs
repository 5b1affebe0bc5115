//! Single-floor A* router.

use std::collections::BinaryHeap;

use tracing::{debug, trace};

use crate::model::{Edge, Node, NodeId, Route};
use crate::{Error, Result};
use super::graph::{Frontier, NavGraph};
use super::{RouteOptions, SearchLimits};

/// Shortest path between two nodes of one snapshot.
///
/// Absent endpoints, empty edge sets and disconnected components all resolve
/// to `Error::NotFound`.
pub fn find_path(
    nodes: &[Node],
    edges: &[Edge],
    start: &NodeId,
    end: &NodeId,
    options: &RouteOptions,
) -> Result<Route> {
    let graph = NavGraph::build(nodes, edges, options.accessible_only, options.pixels_per_meter);
    graph.find_path(start, end, &options.limits)
}

impl<'a> NavGraph<'a> {
    /// A* between two node ids of this graph.
    pub fn find_path(&self, start: &NodeId, end: &NodeId, limits: &SearchLimits) -> Result<Route> {
        let Some(start_idx) = self.index_of(start) else {
            debug!(%start, "start node not in routable set");
            return Err(Error::NotFound(format!("Start node {start}")));
        };
        let Some(end_idx) = self.index_of(end) else {
            debug!(%end, "end node not in routable set");
            return Err(Error::NotFound(format!("End node {end}")));
        };

        match self.astar(start_idx, end_idx, limits)? {
            Some((path, cost)) => Ok(self.route_from(&path, cost)),
            None => Err(Error::NotFound(format!("No path from {start} to {end}"))),
        }
    }

    /// Returns the dense index path and its cost, or `None` once the
    /// frontier is exhausted.
    pub(crate) fn astar(
        &self,
        start: usize,
        goal: usize,
        limits: &SearchLimits,
    ) -> Result<Option<(Vec<usize>, f64)>> {
        let n = self.len();
        let mut g_scores = vec![f64::INFINITY; n];
        let mut came_from: Vec<Option<usize>> = vec![None; n];
        let mut open_set = BinaryHeap::new();
        let mut seq = 0u64;
        let mut nodes_expanded = 0usize;

        g_scores[start] = 0.0;
        open_set.push(Frontier {
            priority: self.heuristic(start, goal),
            g: 0.0,
            node: start,
            seq,
        });

        while let Some(current) = open_set.pop() {
            // Stale entry: a cheaper route to this node was queued later.
            if current.g > g_scores[current.node] {
                continue;
            }

            if current.node == goal {
                let mut path = vec![goal];
                let mut cursor = goal;
                while let Some(prev) = came_from[cursor] {
                    path.push(prev);
                    cursor = prev;
                }
                path.reverse();
                trace!(nodes_expanded, cost = current.g, hops = path.len() - 1, "A* reached goal");
                return Ok(Some((path, current.g)));
            }

            nodes_expanded += 1;
            limits.check(nodes_expanded)?;

            for link in self.links(current.node) {
                let tentative_g = current.g + link.cost;
                if tentative_g < g_scores[link.to] {
                    came_from[link.to] = Some(current.node);
                    g_scores[link.to] = tentative_g;
                    seq += 1;
                    open_set.push(Frontier {
                        priority: tentative_g + self.heuristic(link.to, goal),
                        g: tentative_g,
                        node: link.to,
                        seq,
                    });
                }
            }
        }

        debug!(nodes_expanded, "A* frontier exhausted without reaching goal");
        Ok(None)
    }
}
