//! In-memory snapshot store.
//!
//! The reference implementation of `SnapshotStore`, backed by HashMaps
//! behind `RwLock`s. Clones share the same data.
//!
//! ## Limitations
//!
//! - **No persistence**: everything is lost on drop.
//! - **Unbounded history**: the position log only grows.

use std::collections::HashMap;
use std::sync::Arc;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::model::{Anchor, FloorId, GraphSnapshot, PositionUpdate};
use crate::{Error, Result};
use super::SnapshotStore;

// ============================================================================
// MemoryStore
// ============================================================================

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    floors: RwLock<HashMap<FloorId, GraphSnapshot>>,
    /// event id → floors in registration order
    event_floors: RwLock<HashMap<String, Vec<FloorId>>>,
    anchors: RwLock<HashMap<String, Vec<Anchor>>>,
    /// (event id, device id) → latest update
    live: RwLock<HashMap<(String, String), PositionUpdate>>,
    history: RwLock<Vec<PositionUpdate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store (or replace) a floor and attach it to an event.
    pub fn put_floor(&self, event_id: &str, floor: impl Into<FloorId>, snapshot: GraphSnapshot) {
        let floor = floor.into();
        trace!(event_id, %floor, nodes = snapshot.nodes.len(), "storing floor snapshot");
        self.inner.floors.write().insert(floor.clone(), snapshot);
        let mut events = self.inner.event_floors.write();
        let floors = events.entry(event_id.to_string()).or_default();
        if !floors.contains(&floor) {
            floors.push(floor);
        }
    }

    /// Store a whole event snapshot, split by floor. Floors are joined
    /// only through linked transport nodes, so edges spanning two floors
    /// are not kept.
    pub fn put_event(&self, event_id: &str, snapshot: &GraphSnapshot) {
        let mut kept = 0;
        for floor in snapshot.floors() {
            let part = snapshot.floor(&floor);
            kept += part.edges.len();
            self.put_floor(event_id, floor, part);
        }
        let dropped = snapshot.edges.len().saturating_sub(kept);
        if dropped > 0 {
            debug!(event_id, dropped, "edges outside a single floor not stored");
        }
    }

    pub fn put_anchors(&self, event_id: &str, anchors: Vec<Anchor>) {
        self.inner.anchors.write().insert(event_id.to_string(), anchors);
    }

    /// Latest published position of a device.
    pub fn live_position(&self, event_id: &str, device_id: &str) -> Option<PositionUpdate> {
        self.inner
            .live
            .read()
            .get(&(event_id.to_string(), device_id.to_string()))
            .cloned()
    }

    /// Every published position of a device, oldest first.
    pub fn history(&self, device_id: &str) -> Vec<PositionUpdate> {
        self.inner
            .history
            .read()
            .iter()
            .filter(|u| u.device_id == device_id)
            .cloned()
            .collect()
    }
}

// ============================================================================
// SnapshotStore impl
// ============================================================================

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn floor_snapshot(&self, floor: &FloorId) -> Result<GraphSnapshot> {
        self.inner
            .floors
            .read()
            .get(floor)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Floor {floor}")))
    }

    async fn event_snapshot(&self, event_id: &str) -> Result<GraphSnapshot> {
        let floor_ids = self
            .inner
            .event_floors
            .read()
            .get(event_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("Event {event_id}")))?;

        let floors = self.inner.floors.read();
        let mut merged = GraphSnapshot::default();
        for id in &floor_ids {
            if let Some(part) = floors.get(id) {
                merged.nodes.extend(part.nodes.iter().cloned());
                merged.edges.extend(part.edges.iter().cloned());
            }
        }
        Ok(merged)
    }

    async fn anchors(&self, event_id: &str) -> Result<Vec<Anchor>> {
        Ok(self.inner.anchors.read().get(event_id).cloned().unwrap_or_default())
    }

    async fn publish_position(&self, update: PositionUpdate) -> Result<()> {
        let key = (update.event_id.clone(), update.device_id.clone());
        self.inner.history.write().push(update.clone());
        self.inner.live.write().insert(key, update);
        Ok(())
    }
}
