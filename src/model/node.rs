//! Navigable node on a floor plan.

use serde::{Deserialize, Serialize};

/// Opaque node identifier (UUID-shaped in the record store, free-form here).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque floor identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FloorId(pub String);

impl std::fmt::Display for FloorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FloorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// What a node represents on the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Waypoint,
    Entrance,
    Exit,
    Elevator,
    Stairs,
}

impl NodeKind {
    /// Elevators and stairs are the only kinds that may carry a floor link.
    pub fn is_vertical_transport(self) -> bool {
        matches!(self, NodeKind::Elevator | NodeKind::Stairs)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Waypoint => "waypoint",
            NodeKind::Entrance => "entrance",
            NodeKind::Exit => "exit",
            NodeKind::Elevator => "elevator",
            NodeKind::Stairs => "stairs",
        }
    }
}

/// A point in the navigable graph. Coordinates are floor-plan pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub floor_id: FloorId,
    pub x: f64,
    pub y: f64,
    pub kind: NodeKind,
    #[serde(default = "default_true")]
    pub accessible: bool,
    /// Counterpart on another floor (elevator/stairs only).
    #[serde(default)]
    pub linked_node_id: Option<NodeId>,
    /// Display name used in direction text.
    #[serde(default)]
    pub label: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Node {
    pub fn new(id: impl Into<NodeId>, floor_id: impl Into<FloorId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            floor_id: floor_id.into(),
            x,
            y,
            kind: NodeKind::Waypoint,
            accessible: true,
            linked_node_id: None,
            label: None,
        }
    }

    pub fn with_kind(mut self, kind: NodeKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Link this node to its counterpart on another floor.
    pub fn linked_to(mut self, other: impl Into<NodeId>) -> Self {
        self.linked_node_id = Some(other.into());
        self
    }

    /// Straight-line distance in plan pixels.
    pub fn pixel_distance(&self, other: &Node) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Name used when talking about this node to a person.
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label.clone(),
            _ => match self.kind {
                NodeKind::Waypoint => format!("waypoint {}", self.id),
                kind => format!("the {} ({})", kind.as_str(), self.id),
            },
        }
    }
}
