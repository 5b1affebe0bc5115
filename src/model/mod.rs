//! # Wayfinding Model
//!
//! Clean DTOs shared by every routing, positioning and generation operation.
//! These types cross every boundary: record store ↔ core ↔ caller.
//!
//! Design rule: this module is pure data. No I/O, no state, no async.

pub mod node;
pub mod edge;
pub mod route;
pub mod snapshot;
pub mod anchor;
pub mod floor_object;

pub use node::{Node, NodeId, NodeKind, FloorId};
pub use edge::{Edge, EdgeId};
pub use route::{Route, CrossFloorRoute, FloorSegment, FloorTransition, OrderedRoute};
pub use snapshot::GraphSnapshot;
pub use anchor::{
    Anchor, AnchorId, SignalKind, Reading,
    PositionEstimate, EstimateMethod, PositionUpdate,
};
pub use floor_object::{
    FloorObject, RawFloorObject, ObjectKind, TransportKind, PortalKind, Rect,
};
