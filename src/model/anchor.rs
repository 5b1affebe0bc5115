//! Fixed signal anchors, transient readings, and position estimates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use super::FloorId;

/// Opaque anchor identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnchorId(pub String);

impl std::fmt::Display for AnchorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AnchorId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Ble,
    Wifi,
    Uwb,
}

/// A fixed, externally registered beacon. Read-only to this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub id: AnchorId,
    pub x: f64,
    pub y: f64,
    pub signal_kind: SignalKind,
    #[serde(default)]
    pub floor_id: Option<FloorId>,
    #[serde(default)]
    pub last_seen: Option<DateTime<Utc>>,
}

impl Anchor {
    pub fn new(id: impl Into<AnchorId>, x: f64, y: f64) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            signal_kind: SignalKind::Ble,
            floor_id: None,
            last_seen: None,
        }
    }
}

/// One signal-strength observation of an anchor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub anchor_id: AnchorId,
    /// Received strength, dBm-like, negative for valid readings.
    pub signal_strength: f64,
    /// Expected strength at 1 m.
    #[serde(default)]
    pub reference_power: Option<f64>,
    #[serde(default)]
    pub path_loss_exponent: Option<f64>,
}

impl Reading {
    pub fn new(anchor_id: impl Into<AnchorId>, signal_strength: f64) -> Self {
        Self {
            anchor_id: anchor_id.into(),
            signal_strength,
            reference_power: None,
            path_loss_exponent: None,
        }
    }

    pub fn with_calibration(mut self, reference_power: f64, path_loss_exponent: f64) -> Self {
        self.reference_power = Some(reference_power);
        self.path_loss_exponent = Some(path_loss_exponent);
        self
    }
}

/// How an estimate was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimateMethod {
    SingleAnchor,
    WeightedCentroid,
    Trilateration,
}

/// Estimated (x, y) in plan coordinates with an accuracy radius in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionEstimate {
    pub x: f64,
    pub y: f64,
    pub accuracy_m: f64,
    pub method: EstimateMethod,
}

/// A computed position destined for the live-position feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionUpdate {
    pub device_id: String,
    pub event_id: String,
    #[serde(default)]
    pub floor_id: Option<FloorId>,
    pub estimate: PositionEstimate,
    pub recorded_at: DateTime<Utc>,
}
