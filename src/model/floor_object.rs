//! Floor-plan geometry consumed by the graph auto-generator.
//!
//! Objects arrive from the record store as loosely typed rows
//! ([`RawFloorObject`]: a type tag, a free-text label, a bounding box and an
//! attribute bag). They are classified exactly once, at the boundary, into
//! the closed [`ObjectKind`] variant; everything downstream matches on it.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box in plan pixels. `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Midpoints of the top, right, bottom and left sides.
    pub fn side_midpoints(&self) -> [(f64, f64); 4] {
        let (cx, cy) = self.center();
        [
            (cx, self.y),
            (self.x + self.width, cy),
            (cx, self.y + self.height),
            (self.x, cy),
        ]
    }

    /// Point-in-box test with the box grown by `margin` on every side.
    pub fn contains_with_margin(&self, px: f64, py: f64, margin: f64) -> bool {
        px >= self.x - margin
            && px <= self.x + self.width + margin
            && py >= self.y - margin
            && py <= self.y + self.height + margin
    }
}

/// Vertical transport flavours recognised on plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    Elevator,
    Lift,
    Stairs,
    Escalator,
}

/// Doorway flavours recognised on plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalKind {
    Entrance,
    Exit,
    Door,
    Gate,
}

/// What a floor object means for navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ObjectKind {
    /// Open floor area (hall, lounge, exhibit zone).
    Zone,
    /// Walkway, corridor, aisle or path.
    Walkway,
    VerticalTransport { transport: TransportKind },
    Portal { portal: PortalKind },
    /// Anything else (booths, walls, furniture, decoration). Not navigable.
    Obstacle,
}

/// A classified floor-plan object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorObject {
    pub id: String,
    #[serde(default)]
    pub label: String,
    pub bounds: Rect,
    pub kind: ObjectKind,
    #[serde(default = "default_true")]
    pub accessible: bool,
}

fn default_true() -> bool {
    true
}

impl FloorObject {
    pub fn new(id: impl Into<String>, kind: ObjectKind, bounds: Rect) -> Self {
        Self {
            id: id.into(),
            label: String::new(),
            bounds,
            kind,
            accessible: true,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_accessible(mut self, accessible: bool) -> Self {
        self.accessible = accessible;
        self
    }
}

/// A floor object row as the record store hands it over.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFloorObject {
    pub id: String,
    /// Store-level type tag, e.g. `"zone"`, `"infrastructure"`, `"booth"`.
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default)]
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

const TRANSPORT_KEYWORDS: &[(&str, TransportKind)] = &[
    ("escalator", TransportKind::Escalator),
    ("elevator", TransportKind::Elevator),
    ("lift", TransportKind::Lift),
    ("stair", TransportKind::Stairs),
    ("staircase", TransportKind::Stairs),
    ("stairway", TransportKind::Stairs),
    ("stairwell", TransportKind::Stairs),
];

const PORTAL_KEYWORDS: &[(&str, PortalKind)] = &[
    ("entrance", PortalKind::Entrance),
    ("exit", PortalKind::Exit),
    ("door", PortalKind::Door),
    ("gate", PortalKind::Gate),
];

const WALKWAY_KEYWORDS: &[&str] = &["walkway", "corridor", "aisle", "path"];

/// Lower-cased words of a label, split on anything that is not a letter or digit.
fn label_words(label: &str) -> Vec<String> {
    label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whole-word match, allowing a plural `s`.
fn has_word(words: &[String], keyword: &str) -> bool {
    words.iter().any(|w| w == keyword || w.strip_suffix('s') == Some(keyword))
}

impl RawFloorObject {
    /// Classify by type tag and whole-word label keywords.
    ///
    /// Transport and portal keywords win over the type tag, so a zone
    /// labelled "Main Entrance" becomes a portal. An explicit
    /// `"accessible": false` attribute is honoured; stairs and escalators
    /// default to inaccessible.
    pub fn classify(&self) -> FloorObject {
        let words = label_words(&self.label);
        let kind = if let Some((_, t)) = TRANSPORT_KEYWORDS.iter().find(|(k, _)| has_word(&words, k)) {
            ObjectKind::VerticalTransport { transport: *t }
        } else if let Some((_, p)) = PORTAL_KEYWORDS.iter().find(|(k, _)| has_word(&words, k)) {
            ObjectKind::Portal { portal: *p }
        } else {
            match self.object_type.to_lowercase().as_str() {
                "zone" => ObjectKind::Zone,
                "infrastructure" if WALKWAY_KEYWORDS.iter().any(|k| has_word(&words, k)) => {
                    ObjectKind::Walkway
                }
                _ => ObjectKind::Obstacle,
            }
        };

        let default_accessible = !matches!(
            kind,
            ObjectKind::VerticalTransport {
                transport: TransportKind::Stairs | TransportKind::Escalator
            }
        );
        let accessible = self
            .attributes
            .get("accessible")
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(default_accessible);

        FloorObject {
            id: self.id.clone(),
            label: self.label.clone(),
            bounds: Rect::new(self.x, self.y, self.width, self.height),
            kind,
            accessible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(object_type: &str, label: &str) -> RawFloorObject {
        RawFloorObject {
            id: "o".into(),
            object_type: object_type.into(),
            label: label.into(),
            width: 10.0,
            height: 10.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_zone_and_walkway() {
        assert_eq!(raw("zone", "Hall B").classify().kind, ObjectKind::Zone);
        assert_eq!(raw("infrastructure", "Main Corridor").classify().kind, ObjectKind::Walkway);
        assert_eq!(raw("infrastructure", "Pillar").classify().kind, ObjectKind::Obstacle);
        assert_eq!(raw("booth", "Acme").classify().kind, ObjectKind::Obstacle);
    }

    #[test]
    fn test_classify_transport_and_portals() {
        let stairs = raw("infrastructure", "North Stairs").classify();
        assert_eq!(
            stairs.kind,
            ObjectKind::VerticalTransport { transport: TransportKind::Stairs }
        );
        assert!(!stairs.accessible);

        let lift = raw("infrastructure", "Lift 2").classify();
        assert_eq!(lift.kind, ObjectKind::VerticalTransport { transport: TransportKind::Lift });
        assert!(lift.accessible);

        assert_eq!(
            raw("zone", "Main Entrance").classify().kind,
            ObjectKind::Portal { portal: PortalKind::Entrance }
        );
        assert_eq!(
            raw("infrastructure", "Emergency Exit").classify().kind,
            ObjectKind::Portal { portal: PortalKind::Exit }
        );
    }

    #[test]
    fn test_keywords_match_whole_words() {
        assert_eq!(raw("zone", "Navigate Desk").classify().kind, ObjectKind::Zone);
        assert_eq!(raw("zone", "Delegates Lounge").classify().kind, ObjectKind::Zone);
        assert_eq!(raw("zone", "Outdoor Zone").classify().kind, ObjectKind::Zone);
        assert_eq!(raw("booth", "Forklift Bay").classify().kind, ObjectKind::Obstacle);
        assert_eq!(raw("infrastructure", "Footpath").classify().kind, ObjectKind::Obstacle);

        assert_eq!(
            raw("zone", "Gate B2").classify().kind,
            ObjectKind::Portal { portal: PortalKind::Gate }
        );
        assert_eq!(
            raw("infrastructure", "East-Stairwell").classify().kind,
            ObjectKind::VerticalTransport { transport: TransportKind::Stairs }
        );
        assert_eq!(
            raw("infrastructure", "Lifts (Hall C)").classify().kind,
            ObjectKind::VerticalTransport { transport: TransportKind::Lift }
        );
        assert_eq!(raw("infrastructure", "Side aisles").classify().kind, ObjectKind::Walkway);
    }

    #[test]
    fn test_accessible_attribute_overrides_default() {
        let mut r = raw("zone", "Hall");
        r.attributes.insert("accessible".into(), serde_json::Value::Bool(false));
        assert!(!r.classify().accessible);
    }

    #[test]
    fn test_rect_margin() {
        let r = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert!(r.contains_with_margin(10.5, 5.0, 1.0));
        assert!(!r.contains_with_margin(12.0, 5.0, 1.0));
    }
}
