//! Multi-stop tour ordering.
//!
//! 1. Pairwise distance matrix over `{start} ∪ stops`, using the cross-floor
//!    router as the distance oracle (it delegates to A* for same-floor pairs).
//! 2. Nearest-neighbour construction from the start.
//! 3. 2-opt refinement for small tours: reverse a contiguous run of stops
//!    when that strictly shortens the whole tour; repeat to a local optimum.
//!
//! Each ordered pair is routed once. Tour totals during 2-opt are summed from
//! the matrix, which yields the same numbers as re-routing each leg because
//! the router is deterministic.

use hashbrown::HashSet;
use tracing::{debug, trace};

use crate::model::{CrossFloorRoute, Edge, Node, NodeId, OrderedRoute};
use crate::{Error, Result};
use super::cross_floor::CrossFloorRouter;
use super::{RouteOptions, SearchLimits};

/// Bounds for tour optimisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TourOptions {
    /// Maximum number of stops accepted.
    pub max_stops: usize,
    /// 2-opt runs only when the stop count is at or below this.
    pub two_opt_max_stops: usize,
}

impl Default for TourOptions {
    fn default() -> Self {
        Self {
            max_stops: crate::config::DEFAULT_MAX_STOPS,
            two_opt_max_stops: crate::config::DEFAULT_TWO_OPT_MAX_STOPS,
        }
    }
}

/// Relative slack below which a 2-opt move does not count as an improvement.
const IMPROVEMENT_EPSILON: f64 = 1e-9;

/// Order `stops` into a short visiting sequence starting at `start`.
pub fn optimize_route(
    nodes: &[Node],
    edges: &[Edge],
    start: &NodeId,
    stops: &[NodeId],
    options: &RouteOptions,
) -> Result<OrderedRoute> {
    optimize_route_with(nodes, edges, start, stops, options, &TourOptions::default())
}

pub fn optimize_route_with(
    nodes: &[Node],
    edges: &[Edge],
    start: &NodeId,
    stops: &[NodeId],
    options: &RouteOptions,
    tour: &TourOptions,
) -> Result<OrderedRoute> {
    if stops.is_empty() {
        return Err(Error::InvalidInput("at least one stop is required".into()));
    }
    if stops.len() > tour.max_stops {
        return Err(Error::InvalidInput(format!(
            "{} stops requested, at most {} allowed",
            stops.len(),
            tour.max_stops
        )));
    }
    let mut seen: HashSet<&NodeId> = HashSet::with_capacity(stops.len() + 1);
    seen.insert(start);
    if let Some(repeat) = stops.iter().find(|s| !seen.insert(*s)) {
        return Err(Error::InvalidInput(format!(
            "stop {repeat} is the start or listed more than once"
        )));
    }

    let router = CrossFloorRouter::new(nodes, edges, options);
    let points: Vec<&NodeId> = std::iter::once(start).chain(stops.iter()).collect();
    let k = points.len();

    // legs[i][j]: route from points[i] to points[j]
    let mut legs: Vec<Vec<Option<CrossFloorRoute>>> = vec![vec![None; k]; k];
    let mut dist = vec![vec![0.0; k]; k];
    for i in 0..k {
        for j in 0..k {
            if i == j {
                continue;
            }
            options.limits.poll()?;
            let leg = router.route(points[i], points[j]).map_err(|e| match e {
                Error::NotFound(reason) => {
                    debug!(from = %points[i], to = %points[j], %reason, "tour leg unreachable");
                    Error::Unreachable(format!("{} cannot reach {}: {reason}", points[i], points[j]))
                }
                other => other,
            })?;
            dist[i][j] = leg.total_distance_m;
            legs[i][j] = Some(leg);
        }
    }

    let mut order = nearest_neighbor_order(&dist);
    let nn_length = tour_length(&order, &dist);
    if stops.len() <= tour.two_opt_max_stops {
        order = two_opt_improve(order, &dist, &options.limits)?;
    }
    let total = tour_length(&order, &dist);
    trace!(stops = stops.len(), nn_length, total, "tour optimised");

    let mut route_legs = Vec::with_capacity(k - 1);
    for pair in order.windows(2) {
        let leg = legs[pair[0]][pair[1]]
            .take()
            .ok_or_else(|| Error::Unreachable(format!("leg {} -> {}", points[pair[0]], points[pair[1]])))?;
        route_legs.push(leg);
    }

    Ok(OrderedRoute {
        ordered_node_ids: order.iter().map(|&i| points[i].clone()).collect(),
        total_distance_m: total,
        legs: route_legs,
    })
}

/// Greedy order over a distance matrix, starting at index 0.
///
/// Ties go to the lowest index.
pub fn nearest_neighbor_order(dist: &[Vec<f64>]) -> Vec<usize> {
    let n = dist.len();
    if n == 0 {
        return Vec::new();
    }
    let mut visited = vec![false; n];
    let mut order = Vec::with_capacity(n);
    let mut current = 0usize;
    visited[current] = true;
    order.push(current);

    for _ in 1..n {
        let mut best: Option<(usize, f64)> = None;
        for j in 0..n {
            if visited[j] {
                continue;
            }
            let d = dist[current][j];
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((j, d));
            }
        }
        let Some((next, _)) = best else { break };
        visited[next] = true;
        order.push(next);
        current = next;
    }
    order
}

/// Open-path length of `order` (no return to start).
pub fn tour_length(order: &[usize], dist: &[Vec<f64>]) -> f64 {
    order.windows(2).map(|w| dist[w[0]][w[1]]).sum()
}

/// 2-opt local search with the first position pinned.
///
/// Reversal candidates are `order[i..=k]` for `1 <= i < k < len`. A candidate
/// is accepted only if it strictly shortens the tour; the result is never
/// longer than the input.
pub fn two_opt_improve(mut order: Vec<usize>, dist: &[Vec<f64>], limits: &SearchLimits) -> Result<Vec<usize>> {
    let n = order.len();
    if n < 3 {
        return Ok(order);
    }
    let mut current = tour_length(&order, dist);
    let mut passes = 0usize;
    let mut improved = true;

    while improved {
        improved = false;
        passes += 1;
        limits.poll()?;

        for i in 1..n - 1 {
            for k in (i + 1)..n {
                order[i..=k].reverse();
                let candidate = tour_length(&order, dist);
                if candidate < current - IMPROVEMENT_EPSILON * current.max(1.0) {
                    current = candidate;
                    improved = true;
                } else {
                    order[i..=k].reverse();
                }
            }
        }
    }

    trace!(passes, length = current, "2-opt converged");
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn matrix(points: &[(f64, f64)]) -> Vec<Vec<f64>> {
        points
            .iter()
            .map(|a| points.iter().map(|b| (a.0 - b.0).hypot(a.1 - b.1)).collect())
            .collect()
    }

    #[test]
    fn test_nearest_neighbor_on_line() {
        let dist = matrix(&[(0.0, 0.0), (3.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert_eq!(nearest_neighbor_order(&dist), vec![0, 2, 3, 1]);
    }

    #[test]
    fn test_two_opt_fixes_crossing() {
        // Unit square visited in a crossing order 0 -> 2 -> 1 -> 3.
        let dist = matrix(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)]);
        let crossing = vec![0, 3, 1, 2];
        let before = tour_length(&crossing, &dist);
        let after = two_opt_improve(crossing, &dist, &SearchLimits::default()).unwrap();
        assert!(tour_length(&after, &dist) < before);
        assert_eq!(after[0], 0);
    }

    #[test]
    fn test_two_opt_keeps_short_orders() {
        let dist = matrix(&[(0.0, 0.0), (1.0, 0.0)]);
        assert_eq!(two_opt_improve(vec![0, 1], &dist, &SearchLimits::default()).unwrap(), vec![0, 1]);
    }

    fn corridor() -> (Vec<Node>, Vec<Edge>) {
        let nodes: Vec<Node> = (0..5)
            .map(|i| Node::new(format!("n{i}"), "f1", i as f64 * 10.0, 0.0))
            .collect();
        let edges: Vec<Edge> = (0..4)
            .map(|i| Edge::new(format!("e{i}").as_str(), format!("n{i}"), format!("n{}", i + 1), 1.0))
            .collect();
        (nodes, edges)
    }

    #[test]
    fn test_optimize_visits_every_stop_once() {
        let (nodes, edges) = corridor();
        let stops: Vec<NodeId> = vec!["n4".into(), "n1".into(), "n3".into()];
        let tour = optimize_route(&nodes, &edges, &"n0".into(), &stops, &RouteOptions::default()).unwrap();
        let ids: Vec<&str> = tour.ordered_node_ids.iter().map(|n| n.0.as_str()).collect();
        assert_eq!(ids, vec!["n0", "n1", "n3", "n4"]);
        assert_eq!(tour.total_distance_m, 4.0);
        assert_eq!(tour.legs.len(), 3);
    }

    #[test]
    fn test_unreachable_stop_aborts() {
        let (mut nodes, edges) = corridor();
        nodes.push(Node::new("island", "f1", 100.0, 100.0));
        let stops: Vec<NodeId> = vec!["n2".into(), "island".into()];
        let result = optimize_route(&nodes, &edges, &"n0".into(), &stops, &RouteOptions::default());
        assert!(matches!(result, Err(Error::Unreachable(_))));
    }

    #[test]
    fn test_stop_count_bounds() {
        let (nodes, edges) = corridor();
        let opts = RouteOptions::default();
        assert!(matches!(
            optimize_route(&nodes, &edges, &"n0".into(), &[], &opts),
            Err(Error::InvalidInput(_))
        ));
        let tour = TourOptions { max_stops: 1, ..TourOptions::default() };
        let stops: Vec<NodeId> = vec!["n1".into(), "n2".into()];
        assert!(matches!(
            optimize_route_with(&nodes, &edges, &"n0".into(), &stops, &opts, &tour),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_repeated_stops_rejected() {
        let (nodes, edges) = corridor();
        let opts = RouteOptions::default();
        for stops in [vec!["n2", "n2"], vec!["n2", "n0"], vec!["n0"]] {
            let stops: Vec<NodeId> = stops.into_iter().map(NodeId::from).collect();
            assert!(matches!(
                optimize_route(&nodes, &edges, &"n0".into(), &stops, &opts),
                Err(Error::InvalidInput(_))
            ));
        }
    }
}
