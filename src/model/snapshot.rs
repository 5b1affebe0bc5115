//! GraphSnapshot: the node/edge set a caller hands to one routing query.

use std::collections::BTreeSet;
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use super::{Edge, FloorId, Node, NodeId};
use crate::Result;

/// A consistent node/edge snapshot for one floor or one whole event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl GraphSnapshot {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Distinct floors, sorted.
    pub fn floors(&self) -> Vec<FloorId> {
        let floors: BTreeSet<&FloorId> = self.nodes.iter().map(|n| &n.floor_id).collect();
        floors.into_iter().cloned().collect()
    }

    /// The sub-snapshot for a single floor: its nodes, and the edges whose
    /// endpoints both lie on it. Edges spanning two floors belong to no floor.
    pub fn floor(&self, floor: &FloorId) -> GraphSnapshot {
        let nodes: Vec<Node> = self.nodes.iter().filter(|n| n.floor_id == *floor).cloned().collect();
        let on_floor: HashSet<&NodeId> = nodes.iter().map(|n| &n.id).collect();
        let edges = self
            .edges
            .iter()
            .filter(|e| on_floor.contains(&e.from_node) && on_floor.contains(&e.to_node))
            .cloned()
            .collect();
        drop(on_floor);
        GraphSnapshot { nodes, edges }
    }
}
