//! # Snapshot Store Trait
//!
//! The boundary between the wayfinding core and the record store that owns
//! floor plans, anchors and the live-position feed. The core never caches
//! across calls: every [`Navigator`](crate::Navigator) operation loads a
//! fresh snapshot through this trait.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryStore` | `memory` | In-memory for testing/embedding |

pub mod memory;

use async_trait::async_trait;
use crate::model::{Anchor, FloorId, GraphSnapshot, PositionUpdate};
use crate::Result;

pub use memory::MemoryStore;

/// The record store contract.
///
/// Implementations report missing floors and events as
/// `Error::NotFound` and transport failures as `Error::StorageError`.
#[async_trait]
pub trait SnapshotStore: Send + Sync + 'static {
    // ========================================================================
    // Graph snapshots
    // ========================================================================

    /// All nodes and edges of one floor.
    async fn floor_snapshot(&self, floor: &FloorId) -> Result<GraphSnapshot>;

    /// All nodes and edges of every floor of an event. Floors connect only
    /// through linked transport nodes; edges spanning two floors are never
    /// routed over.
    async fn event_snapshot(&self, event_id: &str) -> Result<GraphSnapshot>;

    // ========================================================================
    // Positioning
    // ========================================================================

    /// Anchors registered for an event. Unknown events have none.
    async fn anchors(&self, event_id: &str) -> Result<Vec<Anchor>>;

    /// Upsert the device's live position and append it to the history log.
    async fn publish_position(&self, update: PositionUpdate) -> Result<()>;
}
