//! # venue-nav: Indoor Wayfinding Core
//!
//! Shortest and multi-stop routes over multi-floor venue graphs, turn-by-turn
//! directions, and position estimates from radio anchor readings.
//!
//! ## Design Principles
//!
//! 1. **Pure core**: every routing, direction, positioning and generation
//!    operation is a function of caller-supplied snapshots
//! 2. **Clean DTOs**: `Node`, `Edge`, `Route`, `Reading` cross all boundaries
//! 3. **Trait at the edge**: `SnapshotStore` is the only contract with the
//!    record store and the live-position feed
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use venue_nav::{GraphSnapshot, Navigator, Node, Edge};
//!
//! # async fn example() -> venue_nav::Result<()> {
//! let nav = Navigator::open_memory().await?;
//! nav.store().put_floor("expo", "ground", GraphSnapshot::new(
//!     vec![Node::new("a", "ground", 0.0, 0.0), Node::new("b", "ground", 100.0, 0.0)],
//!     vec![Edge::new("ab", "a", "b", 10.0)],
//! ));
//!
//! let route = nav.route(&"ground".into(), &"a".into(), &"b".into(), false).await?;
//! for step in nav.directions(&route) {
//!     println!("{}", step.text);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Operations
//!
//! | Operation | Module | Entry point |
//! |-----------|--------|-------------|
//! | Single-floor route | `routing::astar` | [`find_path`] |
//! | Cross-floor route | `routing::cross_floor` | [`find_cross_floor_route`] |
//! | Multi-stop tour | `routing::multi_stop` | [`optimize_route`] |
//! | Directions | `directions` | [`generate_directions`] |
//! | Position estimate | `positioning` | [`estimate_position`] |
//! | Draft graph | `autogen` | [`generate_graph`] |

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod routing;
pub mod directions;
pub mod positioning;
pub mod autogen;
pub mod storage;
pub mod config;

use chrono::Utc;
use tracing::{debug, info};

// ============================================================================
// Re-exports: Model (the DTOs)
// ============================================================================

pub use model::{
    Node, NodeId, NodeKind, FloorId, Edge, EdgeId, GraphSnapshot,
    Route, CrossFloorRoute, FloorSegment, FloorTransition, OrderedRoute,
    Anchor, AnchorId, Reading, PositionEstimate, EstimateMethod, PositionUpdate,
    FloorObject, RawFloorObject, ObjectKind,
};

// ============================================================================
// Re-exports: Operations
// ============================================================================

pub use routing::{
    find_path, find_cross_floor_route, optimize_route, optimize_route_with,
    CancelToken, RouteOptions, SearchLimits, TourOptions,
};
pub use directions::{generate_directions, format_distance, Step, TurnKind};
pub use positioning::{estimate_distance, estimate_position, PositionEstimator};
pub use autogen::{generate_graph, DraftGraph, DraftNode, DraftEdge};
pub use storage::{SnapshotStore, MemoryStore};
pub use config::NavConfig;

// ============================================================================
// Top-level Navigator handle
// ============================================================================

/// The primary entry point. A `Navigator` loads snapshots from a store and
/// runs one core operation per call.
pub struct Navigator<S: SnapshotStore> {
    store: S,
    config: NavConfig,
}

impl<S: SnapshotStore> Navigator<S> {
    /// Create a Navigator over the given store with default tunables.
    pub fn with_store(store: S) -> Self {
        Self { store, config: NavConfig::default() }
    }

    pub fn with_config(mut self, config: NavConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    /// Access the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Shortest path between two nodes of one floor.
    pub async fn route(
        &self,
        floor: &FloorId,
        start: &NodeId,
        end: &NodeId,
        accessible_only: bool,
    ) -> Result<Route> {
        let snapshot = self.store.floor_snapshot(floor).await?;
        debug!(%floor, nodes = snapshot.nodes.len(), edges = snapshot.edges.len(), "floor snapshot loaded");
        let options = self.config.route_options(accessible_only);
        find_path(&snapshot.nodes, &snapshot.edges, start, end, &options)
    }

    /// Shortest route between two nodes anywhere in an event.
    pub async fn route_across_floors(
        &self,
        event_id: &str,
        start: &NodeId,
        end: &NodeId,
        accessible_only: bool,
    ) -> Result<CrossFloorRoute> {
        let snapshot = self.store.event_snapshot(event_id).await?;
        debug!(event_id, nodes = snapshot.nodes.len(), edges = snapshot.edges.len(), "event snapshot loaded");
        let options = self.config.route_options(accessible_only);
        let route = find_cross_floor_route(&snapshot.nodes, &snapshot.edges, start, end, &options)?;
        info!(event_id, %start, %end, floors = route.floor_count(), distance_m = route.total_distance_m, "route found");
        Ok(route)
    }

    /// Visiting order for a set of stops, starting at `start`.
    pub async fn optimize_tour(
        &self,
        event_id: &str,
        start: &NodeId,
        stops: &[NodeId],
        accessible_only: bool,
    ) -> Result<OrderedRoute> {
        let snapshot = self.store.event_snapshot(event_id).await?;
        let options = self.config.route_options(accessible_only);
        let tour = optimize_route_with(
            &snapshot.nodes,
            &snapshot.edges,
            start,
            stops,
            &options,
            &self.config.tour_options(),
        )?;
        info!(event_id, stops = stops.len(), distance_m = tour.total_distance_m, "tour optimised");
        Ok(tour)
    }

    /// Estimate a device's position and publish it to the live feed.
    ///
    /// With a floor given, anchors registered on other floors are ignored.
    /// Returns `Ok(None)` when no reading matches a usable anchor; nothing is
    /// published in that case.
    pub async fn locate(
        &self,
        event_id: &str,
        device_id: &str,
        floor: Option<&FloorId>,
        readings: &[Reading],
    ) -> Result<Option<PositionEstimate>> {
        let anchors: Vec<Anchor> = self
            .store
            .anchors(event_id)
            .await?
            .into_iter()
            .filter(|a| match (floor, &a.floor_id) {
                (Some(wanted), Some(on)) => wanted == on,
                _ => true,
            })
            .collect();

        let Some(estimate) = self.config.estimator().estimate(readings, &anchors) else {
            debug!(event_id, device_id, readings = readings.len(), "no position estimate");
            return Ok(None);
        };

        self.store
            .publish_position(PositionUpdate {
                device_id: device_id.to_string(),
                event_id: event_id.to_string(),
                floor_id: floor.cloned(),
                estimate,
                recorded_at: Utc::now(),
            })
            .await?;
        info!(
            event_id,
            device_id,
            x = estimate.x,
            y = estimate.y,
            accuracy_m = estimate.accuracy_m,
            method = ?estimate.method,
            "position published"
        );
        Ok(Some(estimate))
    }

    /// Turn-by-turn directions at the configured plan scale.
    pub fn directions(&self, route: &Route) -> Vec<Step> {
        route.directions(self.config.pixels_per_meter)
    }

    /// Draft graph for a floor's objects at the configured plan scale.
    pub fn draft_graph(&self, objects: &[FloorObject]) -> Result<DraftGraph> {
        generate_graph(objects, self.config.pixels_per_meter)
    }
}

/// In-memory navigator for testing and embedding.
impl Navigator<MemoryStore> {
    pub async fn open_memory() -> Result<Self> {
        Ok(Self::with_store(MemoryStore::new()))
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unreachable: {0}")]
    Unreachable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
