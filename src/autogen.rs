//! Draft navigation graphs from classified floor-plan objects.
//!
//! The output is a starting point for manual editing. It is not guaranteed
//! to be connected, and nodes carry indices rather than store ids until
//! [`DraftGraph::into_snapshot`] assigns them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{
    Edge, FloorId, FloorObject, GraphSnapshot, Node, NodeId, NodeKind, ObjectKind, PortalKind,
    TransportKind,
};
use crate::{Error, Result};

/// Objects wider or taller than this also get side-midpoint nodes.
const SPAN_NODES_MIN_M: f64 = 2.0;
/// Nodes closer than this are always connected.
const NEAR_M: f64 = 3.0;
/// Nodes farther apart than this are never connected.
const MAX_EDGE_M: f64 = 15.0;
/// Slack around a source object's bounds when testing containment.
const CONTAINMENT_MARGIN_M: f64 = 0.5;
/// Edges are never shorter than this.
const MIN_EDGE_M: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftNode {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub kind: NodeKind,
    pub accessible: bool,
    /// Id of the floor object this node was placed for.
    pub source_object: String,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftEdge {
    /// Node index; always lower than `to`.
    pub from: usize,
    pub to: usize,
    pub distance_m: f64,
    pub accessible: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DraftGraph {
    pub nodes: Vec<DraftNode>,
    pub edges: Vec<DraftEdge>,
}

impl DraftGraph {
    /// Assign store ids and produce a routable snapshot for one floor.
    ///
    /// Edge ids are derived from the two node ids.
    pub fn into_snapshot<F>(self, floor_id: impl Into<FloorId>, mut id_fn: F) -> GraphSnapshot
    where
        F: FnMut(&DraftNode) -> NodeId,
    {
        let floor_id = floor_id.into();
        let ids: Vec<NodeId> = self.nodes.iter().map(&mut id_fn).collect();
        let nodes = self
            .nodes
            .into_iter()
            .zip(&ids)
            .map(|(draft, id)| {
                let mut node = Node::new(id.clone(), floor_id.clone(), draft.x, draft.y)
                    .with_kind(draft.kind)
                    .with_accessible(draft.accessible);
                node.label = draft.label;
                node
            })
            .collect();
        let edges = self
            .edges
            .into_iter()
            .map(|e| {
                let (a, b) = (&ids[e.from], &ids[e.to]);
                Edge::new(format!("{a}~{b}").as_str(), a.clone(), b.clone(), e.distance_m)
                    .with_accessible(e.accessible)
            })
            .collect();
        GraphSnapshot::new(nodes, edges)
    }
}

/// Derive a draft graph from classified objects.
///
/// `pixels_per_meter` converts the plan's pixel geometry into the meter
/// thresholds used for node placement and edge creation.
pub fn generate_graph(objects: &[FloorObject], pixels_per_meter: f64) -> Result<DraftGraph> {
    if !(pixels_per_meter.is_finite() && pixels_per_meter > 0.0) {
        return Err(Error::InvalidInput(format!(
            "pixels_per_meter must be positive and finite, got {pixels_per_meter}"
        )));
    }

    let mut nodes = Vec::new();
    // Parallel to `nodes`: the object each node came from.
    let mut sources: Vec<&FloorObject> = Vec::new();

    for object in objects {
        let Some(kind) = node_kind(&object.kind) else {
            continue;
        };
        let mut place = |x: f64, y: f64| {
            let index = nodes.len();
            nodes.push(DraftNode {
                index,
                x,
                y,
                kind,
                accessible: object.accessible,
                source_object: object.id.clone(),
                label: (!object.label.is_empty()).then(|| object.label.clone()),
            });
            sources.push(object);
        };

        let (cx, cy) = object.bounds.center();
        place(cx, cy);

        if kind == NodeKind::Waypoint {
            let span_px = SPAN_NODES_MIN_M * pixels_per_meter;
            if object.bounds.width > span_px || object.bounds.height > span_px {
                for (x, y) in object.bounds.side_midpoints() {
                    place(x, y);
                }
            }
        }
    }

    let near_px = NEAR_M * pixels_per_meter;
    let max_px = MAX_EDGE_M * pixels_per_meter;
    let margin_px = CONTAINMENT_MARGIN_M * pixels_per_meter;

    let mut edges = Vec::new();
    for i in 0..nodes.len() {
        for j in (i + 1)..nodes.len() {
            let (a, b) = (&nodes[i], &nodes[j]);
            let d = (a.x - b.x).hypot(a.y - b.y);
            if d > max_px {
                continue;
            }
            let same_source = a.source_object == b.source_object;
            let contained = sources[j].bounds.contains_with_margin(a.x, a.y, margin_px)
                || sources[i].bounds.contains_with_margin(b.x, b.y, margin_px);
            if same_source || d < near_px || contained {
                edges.push(DraftEdge {
                    from: i,
                    to: j,
                    distance_m: (d / pixels_per_meter).max(MIN_EDGE_M),
                    accessible: a.accessible && b.accessible,
                });
            }
        }
    }

    debug!(
        objects = objects.len(),
        nodes = nodes.len(),
        edges = edges.len(),
        "draft graph generated"
    );
    Ok(DraftGraph { nodes, edges })
}

/// Node kind placed for an object, `None` for objects that get no node.
fn node_kind(kind: &ObjectKind) -> Option<NodeKind> {
    match kind {
        ObjectKind::Zone | ObjectKind::Walkway => Some(NodeKind::Waypoint),
        ObjectKind::VerticalTransport { transport } => Some(match transport {
            TransportKind::Elevator | TransportKind::Lift => NodeKind::Elevator,
            TransportKind::Stairs | TransportKind::Escalator => NodeKind::Stairs,
        }),
        ObjectKind::Portal { portal } => Some(match portal {
            PortalKind::Exit => NodeKind::Exit,
            PortalKind::Entrance | PortalKind::Door | PortalKind::Gate => NodeKind::Entrance,
        }),
        ObjectKind::Obstacle => None,
    }
}
