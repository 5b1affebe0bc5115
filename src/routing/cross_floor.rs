//! Cross-floor router.
//!
//! Searches a meta-graph whose states are "standing on node N" where N is
//! either the start or the arrival side of a vertical-transport link. From
//! each state one Dijkstra run over the state's floor prices every reachable
//! transport node (and the goal, on the goal floor). States are expanded in
//! increasing cumulative distance; the search stops once no queued state can
//! beat the best complete route, so the result is optimal over the available
//! links.
//!
//! Equal-cost states are expanded in insertion order.

use std::collections::{BTreeMap, BinaryHeap};

use hashbrown::HashMap;
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::model::{
    CrossFloorRoute, Edge, FloorId, FloorSegment, FloorTransition, Node, NodeId, NodeKind,
};
use crate::{Error, Result};
use super::graph::{Frontier, NavGraph, ShortestPathTree};
use super::RouteOptions;

/// Shortest route between two nodes that may lie on different floors.
pub fn find_cross_floor_route(
    nodes: &[Node],
    edges: &[Edge],
    start: &NodeId,
    end: &NodeId,
    options: &RouteOptions,
) -> Result<CrossFloorRoute> {
    CrossFloorRouter::new(nodes, edges, options).route(start, end)
}

/// Reusable router over one snapshot: per-floor graphs and the transport
/// link table are built once and shared by every query.
#[derive(Debug)]
pub struct CrossFloorRouter<'a> {
    nodes: HashMap<&'a NodeId, &'a Node>,
    floors: BTreeMap<&'a FloorId, NavGraph<'a>>,
    /// Per floor, in snapshot order: transport node → counterparts on other floors.
    transports: HashMap<&'a FloorId, Vec<(&'a Node, SmallVec<[&'a Node; 2]>)>>,
    options: RouteOptions,
}

/// Back-pointer for a meta-graph state.
#[derive(Debug, Clone, Copy)]
struct Arrival<'a> {
    /// State we left from.
    from_state: &'a NodeId,
    /// Transport node we walked to on the previous floor.
    via: &'a Node,
}

impl<'a> CrossFloorRouter<'a> {
    pub fn new(nodes: &'a [Node], edges: &[Edge], options: &RouteOptions) -> Self {
        let mut by_id: HashMap<&'a NodeId, &'a Node> = HashMap::new();
        for node in nodes {
            by_id.entry(&node.id).or_insert(node);
        }

        let floor_ids: std::collections::BTreeSet<&'a FloorId> =
            nodes.iter().map(|n| &n.floor_id).collect();
        let floors = floor_ids
            .into_iter()
            .map(|floor| {
                let graph = NavGraph::build_filtered(
                    nodes,
                    edges,
                    options.accessible_only,
                    options.pixels_per_meter,
                    |n| n.floor_id == *floor,
                );
                (floor, graph)
            })
            .collect();

        // departure node → arrival nodes on other floors
        let mut links: HashMap<&'a NodeId, SmallVec<[&'a Node; 2]>> = HashMap::new();
        let mut add = |from: &'a Node, to: &'a Node| {
            let entry = links.entry(&from.id).or_default();
            if !entry.iter().any(|n| n.id == to.id) {
                entry.push(to);
            }
        };
        for node in nodes {
            let Some(other) = node.linked_node_id.as_ref().and_then(|id| by_id.get(id).copied()) else {
                continue;
            };
            if Self::can_depart(node, other, options.accessible_only) {
                add(node, other);
            }
            // A link between two transport nodes works both ways.
            if other.kind.is_vertical_transport() && Self::can_depart(other, node, options.accessible_only) {
                add(other, node);
            }
        }

        let mut transports: HashMap<&'a FloorId, Vec<(&'a Node, SmallVec<[&'a Node; 2]>)>> =
            HashMap::new();
        for node in nodes {
            if let Some(counterparts) = links.remove(&node.id) {
                transports.entry(&node.floor_id).or_default().push((node, counterparts));
            }
        }

        Self { nodes: by_id, floors, transports, options: options.clone() }
    }

    /// Whether `from` can carry a traveller to `to`. Only the departing
    /// node's kind matters; the arrival node is reachable when its floor
    /// graph kept it.
    fn can_depart(from: &Node, to: &Node, accessible_only: bool) -> bool {
        if !from.kind.is_vertical_transport() || from.floor_id == to.floor_id {
            return false;
        }
        !accessible_only || (from.kind == NodeKind::Elevator && from.accessible)
    }

    pub fn route(&self, start: &NodeId, end: &NodeId) -> Result<CrossFloorRoute> {
        let start_node = *self
            .nodes
            .get(start)
            .ok_or_else(|| Error::NotFound(format!("Start node {start}")))?;
        let end_node = *self
            .nodes
            .get(end)
            .ok_or_else(|| Error::NotFound(format!("End node {end}")))?;

        if start_node.floor_id == end_node.floor_id {
            let graph = self.floor_graph(&start_node.floor_id)?;
            return graph
                .find_path(start, end, &self.options.limits)
                .map(CrossFloorRoute::single_floor);
        }

        self.search(start_node, end_node)
    }

    fn floor_graph(&self, floor: &FloorId) -> Result<&NavGraph<'a>> {
        self.floors
            .get(floor)
            .ok_or_else(|| Error::NotFound(format!("Floor {floor}")))
    }

    fn search(&self, start: &'a Node, goal: &'a Node) -> Result<CrossFloorRoute> {
        let limits = &self.options.limits;
        let goal_floor = &goal.floor_id;

        let mut states: Vec<&'a Node> = vec![start];
        let mut state_index: HashMap<&'a NodeId, usize> = HashMap::new();
        state_index.insert(&start.id, 0);
        let mut best: Vec<f64> = vec![0.0];
        let mut arrivals: Vec<Option<Arrival<'a>>> = vec![None];
        let mut trees: HashMap<usize, ShortestPathTree> = HashMap::new();

        let mut frontier = BinaryHeap::new();
        let mut seq = 0u64;
        frontier.push(Frontier { priority: 0.0, g: 0.0, node: 0, seq });

        // (total cost, state index that walks to the goal)
        let mut best_complete: Option<(f64, usize)> = None;
        let mut expanded = 0usize;

        while let Some(current) = frontier.pop() {
            if current.g > best[current.node] {
                continue;
            }
            if best_complete.is_some_and(|(cost, _)| current.g >= cost) {
                break;
            }
            expanded += 1;
            limits.check(expanded)?;

            let here = states[current.node];
            let Ok(graph) = self.floor_graph(&here.floor_id) else { continue };
            let Some(src) = graph.index_of(&here.id) else { continue };
            let tree = graph.shortest_path_tree(src, limits)?;

            if here.floor_id == *goal_floor {
                if let Some(d) = graph.index_of(&goal.id).and_then(|g| tree.distance_to(g)) {
                    let total = current.g + d;
                    if best_complete.is_none_or(|(cost, _)| total < cost) {
                        best_complete = Some((total, current.node));
                    }
                }
            }

            let transports = self.transports.get(&here.floor_id).map(Vec::as_slice).unwrap_or(&[]);
            for (via, counterparts) in transports {
                let Some(t_idx) = graph.index_of(&via.id) else { continue };
                let Some(walk) = tree.distance_to(t_idx) else { continue };
                let via: &'a Node = *via;
                for &arrive in counterparts {
                    let cost = current.g + walk + self.options.floor_transfer_cost_m;
                    let idx = *state_index.entry(&arrive.id).or_insert_with(|| {
                        states.push(arrive);
                        best.push(f64::INFINITY);
                        arrivals.push(None);
                        states.len() - 1
                    });
                    if cost < best[idx] {
                        best[idx] = cost;
                        arrivals[idx] = Some(Arrival { from_state: &here.id, via });
                        seq += 1;
                        frontier.push(Frontier { priority: cost, g: cost, node: idx, seq });
                    }
                }
            }

            trees.insert(current.node, tree);
        }

        trace!(expanded, states = states.len(), "cross-floor meta search finished");

        let Some((total, last_state)) = best_complete else {
            debug!(start = %start.id, goal = %goal.id, "no cross-floor route");
            return Err(Error::NotFound(format!(
                "No route from {} to {} across floors",
                start.id, goal.id
            )));
        };

        // Walk arrivals back from the state that reached the goal.
        let mut segments = Vec::new();
        let mut transitions = Vec::new();
        let mut state = last_state;
        let mut target: &'a Node = goal;
        loop {
            let here = states[state];
            segments.push(self.segment(here, target, &trees, state)?);
            match arrivals[state] {
                Some(arrival) => {
                    transitions.push(FloorTransition {
                        from_node: arrival.via.id.clone(),
                        to_node: here.id.clone(),
                        from_floor: arrival.via.floor_id.clone(),
                        to_floor: here.floor_id.clone(),
                        kind: arrival.via.kind,
                    });
                    target = arrival.via;
                    state = state_index[arrival.from_state];
                }
                None => break,
            }
        }
        segments.reverse();
        transitions.reverse();

        Ok(CrossFloorRoute { segments, transitions, total_distance_m: total })
    }

    fn segment(
        &self,
        from: &'a Node,
        to: &'a Node,
        trees: &HashMap<usize, ShortestPathTree>,
        state: usize,
    ) -> Result<FloorSegment> {
        let graph = self.floor_graph(&from.floor_id)?;
        let missing = || Error::NotFound(format!("Segment {} -> {}", from.id, to.id));
        let tree = trees.get(&state).ok_or_else(missing)?;
        let target = graph.index_of(&to.id).ok_or_else(missing)?;
        let path = tree.path_to(target).ok_or_else(missing)?;
        let distance = tree.distance_to(target).ok_or_else(missing)?;
        Ok(FloorSegment {
            floor_id: from.floor_id.clone(),
            route: graph.route_from(&path, distance),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Floor 1: a - e1 (elevator) and a - s1 (stairs, closer).
    /// Floor 2: e2 - b and s2 - b.
    fn building() -> (Vec<Node>, Vec<Edge>) {
        let nodes = vec![
            Node::new("a", "f1", 0.0, 0.0),
            Node::new("e1", "f1", 100.0, 0.0).with_kind(NodeKind::Elevator).linked_to("e2"),
            Node::new("s1", "f1", 30.0, 0.0)
                .with_kind(NodeKind::Stairs)
                .with_accessible(false)
                .linked_to("s2"),
            Node::new("e2", "f2", 100.0, 0.0).with_kind(NodeKind::Elevator),
            Node::new("s2", "f2", 30.0, 0.0).with_kind(NodeKind::Stairs).with_accessible(false),
            Node::new("b", "f2", 50.0, 50.0),
        ];
        let edges = vec![
            Edge::new("a-e1", "a", "e1", 10.0),
            Edge::new("a-s1", "a", "s1", 3.0),
            Edge::new("e2-b", "e2", "b", 7.0),
            Edge::new("s2-b", "s2", "b", 5.0),
        ];
        (nodes, edges)
    }

    #[test]
    fn test_prefers_cheaper_stairs() {
        let (nodes, edges) = building();
        let route = find_cross_floor_route(&nodes, &edges, &"a".into(), &"b".into(), &RouteOptions::default()).unwrap();
        assert_eq!(route.total_distance_m, 8.0);
        assert_eq!(route.transitions.len(), 1);
        assert_eq!(route.transitions[0].kind, NodeKind::Stairs);
        let ids: Vec<String> = route.node_ids().into_iter().map(|n| n.0).collect();
        assert_eq!(ids, vec!["a", "s1", "s2", "b"]);
    }

    #[test]
    fn test_accessible_only_uses_elevator() {
        let (nodes, edges) = building();
        let opts = RouteOptions::default().accessible();
        let route = find_cross_floor_route(&nodes, &edges, &"a".into(), &"b".into(), &opts).unwrap();
        assert_eq!(route.total_distance_m, 17.0);
        assert_eq!(route.transitions[0].kind, NodeKind::Elevator);
        assert_eq!(route.segments.len(), 2);
        assert_eq!(route.segments[0].floor_id, FloorId::from("f1"));
        assert_eq!(route.segments[1].floor_id, FloorId::from("f2"));
    }

    #[test]
    fn test_link_declared_on_one_side_works_both_ways() {
        let (nodes, edges) = building();
        let route = find_cross_floor_route(&nodes, &edges, &"b".into(), &"a".into(), &RouteOptions::default()).unwrap();
        assert_eq!(route.total_distance_m, 8.0);
        assert_eq!(route.transitions[0].from_floor, FloorId::from("f2"));
    }

    #[test]
    fn test_transfer_cost_added_per_hop() {
        let (nodes, edges) = building();
        let opts = RouteOptions::default().with_transfer_cost(4.0);
        let route = find_cross_floor_route(&nodes, &edges, &"a".into(), &"b".into(), &opts).unwrap();
        assert_eq!(route.total_distance_m, 12.0);
    }

    #[test]
    fn test_same_floor_delegates() {
        let (nodes, edges) = building();
        let route = find_cross_floor_route(&nodes, &edges, &"a".into(), &"e1".into(), &RouteOptions::default()).unwrap();
        assert_eq!(route.segments.len(), 1);
        assert!(route.transitions.is_empty());
        assert_eq!(route.total_distance_m, 10.0);
    }

    #[test]
    fn test_without_links_not_found() {
        let (mut nodes, edges) = building();
        for n in &mut nodes {
            n.linked_node_id = None;
        }
        assert!(matches!(
            find_cross_floor_route(&nodes, &edges, &"a".into(), &"b".into(), &RouteOptions::default()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_keeps_searching_after_first_arrival_on_goal_floor() {
        // Stairs are cheaper to reach but land far from b.
        let nodes = vec![
            Node::new("a", "f1", 0.0, 0.0),
            Node::new("s1", "f1", 30.0, 0.0).with_kind(NodeKind::Stairs).linked_to("s2"),
            Node::new("e1", "f1", 100.0, 0.0).with_kind(NodeKind::Elevator).linked_to("e2"),
            Node::new("s2", "f2", 30.0, 0.0).with_kind(NodeKind::Stairs),
            Node::new("e2", "f2", 100.0, 0.0).with_kind(NodeKind::Elevator),
            Node::new("b", "f2", 100.0, 10.0),
        ];
        let edges = vec![
            Edge::new("a-s1", "a", "s1", 3.0),
            Edge::new("a-e1", "a", "e1", 10.0),
            Edge::new("s2-b", "s2", "b", 20.0),
            Edge::new("e2-b", "e2", "b", 1.0),
        ];
        let route = find_cross_floor_route(&nodes, &edges, &"a".into(), &"b".into(), &RouteOptions::default()).unwrap();
        assert_eq!(route.total_distance_m, 11.0);
        assert_eq!(route.transitions[0].kind, NodeKind::Elevator);
        let ids: Vec<String> = route.node_ids().into_iter().map(|n| n.0).collect();
        assert_eq!(ids, vec!["a", "e1", "e2", "b"]);
    }

    #[test]
    fn test_elevator_linked_to_landing_waypoint() {
        let nodes = vec![
            Node::new("a", "f1", 0.0, 0.0),
            Node::new("e1", "f1", 10.0, 0.0).with_kind(NodeKind::Elevator).linked_to("land"),
            Node::new("land", "f2", 10.0, 0.0),
            Node::new("b", "f2", 20.0, 0.0),
        ];
        let edges = vec![
            Edge::new("a-e1", "a", "e1", 1.0),
            Edge::new("land-b", "land", "b", 1.0),
        ];

        for opts in [RouteOptions::default(), RouteOptions::default().accessible()] {
            let route = find_cross_floor_route(&nodes, &edges, &"a".into(), &"b".into(), &opts).unwrap();
            assert_eq!(route.total_distance_m, 2.0);
            assert_eq!(route.transitions[0].to_node, NodeId::from("land"));
            assert_eq!(route.transitions[0].kind, NodeKind::Elevator);
        }

        // The landing is not a transport node, so nothing carries back down.
        assert!(matches!(
            find_cross_floor_route(&nodes, &edges, &"b".into(), &"a".into(), &RouteOptions::default()),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_accessible_only_skips_inaccessible_landing() {
        let nodes = vec![
            Node::new("a", "f1", 0.0, 0.0),
            Node::new("e1", "f1", 10.0, 0.0).with_kind(NodeKind::Elevator).linked_to("land"),
            Node::new("land", "f2", 10.0, 0.0).with_accessible(false),
            Node::new("b", "f2", 20.0, 0.0),
        ];
        let edges = vec![
            Edge::new("a-e1", "a", "e1", 1.0),
            Edge::new("land-b", "land", "b", 1.0),
        ];
        assert!(find_cross_floor_route(&nodes, &edges, &"a".into(), &"b".into(), &RouteOptions::default()).is_ok());
        let opts = RouteOptions::default().accessible();
        assert!(matches!(
            find_cross_floor_route(&nodes, &edges, &"a".into(), &"b".into(), &opts),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_three_floor_chain() {
        let nodes = vec![
            Node::new("a", "f1", 0.0, 0.0),
            Node::new("e1", "f1", 10.0, 0.0).with_kind(NodeKind::Elevator).linked_to("e2"),
            Node::new("e2", "f2", 10.0, 0.0).with_kind(NodeKind::Elevator).linked_to("e3"),
            Node::new("e3", "f3", 10.0, 0.0).with_kind(NodeKind::Elevator),
            Node::new("c", "f3", 20.0, 0.0),
        ];
        let edges = vec![
            Edge::new("1", "a", "e1", 1.0),
            Edge::new("2", "e3", "c", 1.0),
        ];
        let route = find_cross_floor_route(&nodes, &edges, &"a".into(), &"c".into(), &RouteOptions::default()).unwrap();
        assert_eq!(route.transitions.len(), 2);
        assert_eq!(route.segments.len(), 3);
        assert_eq!(route.total_distance_m, 2.0);
        assert_eq!(route.segments[1].route.ordered_node_ids, vec![NodeId::from("e2")]);
    }
}
