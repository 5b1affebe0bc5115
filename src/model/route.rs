//! Route results, ephemeral, built per query and owned by the caller.

use serde::{Deserialize, Serialize};
use super::{FloorId, Node, NodeId, NodeKind};

/// A single-floor path: node -> node -> node ...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Node ids in travel order. Never empty for a found route.
    pub ordered_node_ids: Vec<NodeId>,
    /// The nodes themselves, parallel to `ordered_node_ids`.
    pub nodes: Vec<Node>,
    /// Sum of effective edge costs (`distance_m * weight_modifier`).
    pub total_distance_m: f64,
}

impl Route {
    /// A zero-length route that starts and ends on `node`.
    pub fn single(node: Node) -> Self {
        Self {
            ordered_node_ids: vec![node.id.clone()],
            nodes: vec![node],
            total_distance_m: 0.0,
        }
    }

    /// Number of hops.
    pub fn len(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn start(&self) -> Option<&Node> {
        self.nodes.first()
    }

    pub fn end(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// Turn-by-turn directions for this route.
    pub fn directions(&self, pixels_per_meter: f64) -> Vec<crate::directions::Step> {
        crate::directions::generate_directions(&self.nodes, pixels_per_meter)
    }
}

/// The portion of a cross-floor route that stays on one floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorSegment {
    pub floor_id: FloorId,
    pub route: Route,
}

/// A hop between floors through a linked elevator/stairs pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorTransition {
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub from_floor: FloorId,
    pub to_floor: FloorId,
    pub kind: NodeKind,
}

/// Route that may span several floors.
///
/// `segments.len() == transitions.len() + 1`; transition `i` joins the last
/// node of segment `i` to the first node of segment `i + 1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossFloorRoute {
    pub segments: Vec<FloorSegment>,
    pub transitions: Vec<FloorTransition>,
    pub total_distance_m: f64,
}

impl CrossFloorRoute {
    pub fn single_floor(route: Route) -> Self {
        let floor_id = route
            .start()
            .map(|n| n.floor_id.clone())
            .unwrap_or_else(|| FloorId(String::new()));
        let total_distance_m = route.total_distance_m;
        Self {
            segments: vec![FloorSegment { floor_id, route }],
            transitions: Vec::new(),
            total_distance_m,
        }
    }

    pub fn floor_count(&self) -> usize {
        self.segments.len()
    }

    /// All node ids in travel order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.segments
            .iter()
            .flat_map(|s| s.route.ordered_node_ids.iter().cloned())
            .collect()
    }
}

/// Result of multi-stop optimisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderedRoute {
    /// Visiting order: the start followed by every stop exactly once.
    pub ordered_node_ids: Vec<NodeId>,
    pub total_distance_m: f64,
    /// One leg per consecutive pair in `ordered_node_ids`.
    pub legs: Vec<CrossFloorRoute>,
}

impl OrderedRoute {
    /// The full walked node sequence, with leg joints listed once.
    pub fn path_node_ids(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        for leg in &self.legs {
            for id in leg.node_ids() {
                if out.last() != Some(&id) {
                    out.push(id);
                }
            }
        }
        out
    }
}
