//! Edge (walkable connection) between two nodes.

use serde::{Deserialize, Serialize};
use super::NodeId;

/// Opaque edge identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

impl std::fmt::Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A traversable connection. `bidirectional = false` means from → to only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub from_node: NodeId,
    pub to_node: NodeId,
    pub distance_m: f64,
    #[serde(default = "default_true")]
    pub bidirectional: bool,
    #[serde(default = "default_true")]
    pub accessible: bool,
    #[serde(default = "default_weight")]
    pub weight_modifier: f64,
}

fn default_true() -> bool {
    true
}

fn default_weight() -> f64 {
    1.0
}

impl Edge {
    pub fn new(
        id: impl Into<EdgeId>,
        from: impl Into<NodeId>,
        to: impl Into<NodeId>,
        distance_m: f64,
    ) -> Self {
        Self {
            id: id.into(),
            from_node: from.into(),
            to_node: to.into(),
            distance_m,
            bidirectional: true,
            accessible: true,
            weight_modifier: 1.0,
        }
    }

    pub fn one_way(mut self) -> Self {
        self.bidirectional = false;
        self
    }

    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    pub fn with_weight(mut self, weight_modifier: f64) -> Self {
        self.weight_modifier = weight_modifier;
        self
    }

    /// Traversal cost: `distance_m * weight_modifier`.
    ///
    /// Returns `None` for self-edges and costs that are negative or not finite;
    /// the router drops those edges.
    pub fn cost(&self) -> Option<f64> {
        if self.from_node == self.to_node {
            return None;
        }
        let cost = self.distance_m * self.weight_modifier;
        (cost.is_finite() && cost >= 0.0).then_some(cost)
    }
}
