//! # Routing
//!
//! Shortest paths over caller-supplied node/edge snapshots.
//!
//! | Operation | Module | Algorithm |
//! |-----------|--------|-----------|
//! | [`find_path`] | `astar` | A* on one floor, Euclidean heuristic |
//! | [`find_cross_floor_route`] | `cross_floor` | Best-first search over transport links |
//! | [`optimize_route`] | `multi_stop` | Nearest neighbour + 2-opt |
//!
//! Every operation is a pure function of its inputs. Adjacency is rebuilt
//! per call; nothing is cached between calls.

pub mod graph;
pub mod astar;
pub mod cross_floor;
pub mod multi_stop;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::{Error, Result};

pub use graph::{NavGraph, ShortestPathTree};
pub use astar::find_path;
pub use cross_floor::{CrossFloorRouter, find_cross_floor_route};
pub use multi_stop::{
    TourOptions, optimize_route, optimize_route_with,
    nearest_neighbor_order, two_opt_improve, tour_length,
};

// ============================================================================
// Cancellation
// ============================================================================

/// Cooperative cancellation flag shared between a caller and a running search.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Bounds on a single search. The default is unbounded.
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    pub cancel: Option<CancelToken>,
    pub deadline: Option<Instant>,
    /// Node expansions allowed per individual search.
    pub max_expansions: Option<usize>,
}

/// How often (in expansions) the clock and the cancel flag are polled.
const POLL_INTERVAL: usize = 64;

impl SearchLimits {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_max_expansions(mut self, max: usize) -> Self {
        self.max_expansions = Some(max);
        self
    }

    /// Called once per expansion with the running count. The first
    /// expansion always polls.
    pub(crate) fn check(&self, expanded: usize) -> Result<()> {
        if let Some(max) = self.max_expansions {
            if expanded > max {
                return Err(Error::Cancelled(format!("expansion budget of {max} exhausted")));
            }
        }
        if expanded == 1 || expanded % POLL_INTERVAL == 0 {
            self.poll()?;
        }
        Ok(())
    }

    /// Check the cancel flag and deadline unconditionally.
    pub(crate) fn poll(&self) -> Result<()> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Err(Error::Cancelled("cancelled by caller".into()));
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(Error::Cancelled("deadline exceeded".into()));
        }
        Ok(())
    }
}

// ============================================================================
// Route options
// ============================================================================

/// Per-call routing parameters.
#[derive(Debug, Clone)]
pub struct RouteOptions {
    /// Exclude inaccessible nodes and edges; cross floors by accessible elevators only.
    pub accessible_only: bool,
    /// Plan scale used to turn pixel distances into meters for the heuristic.
    pub pixels_per_meter: f64,
    /// Cost charged for each hop through a vertical-transport link.
    pub floor_transfer_cost_m: f64,
    pub limits: SearchLimits,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            accessible_only: false,
            pixels_per_meter: crate::config::DEFAULT_PIXELS_PER_METER,
            floor_transfer_cost_m: 0.0,
            limits: SearchLimits::default(),
        }
    }
}

impl RouteOptions {
    pub fn accessible(mut self) -> Self {
        self.accessible_only = true;
        self
    }

    pub fn with_scale(mut self, pixels_per_meter: f64) -> Self {
        self.pixels_per_meter = pixels_per_meter;
        self
    }

    pub fn with_transfer_cost(mut self, cost_m: f64) -> Self {
        self.floor_transfer_cost_m = cost_m;
        self
    }

    pub fn with_limits(mut self, limits: SearchLimits) -> Self {
        self.limits = limits;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_never_trip() {
        let limits = SearchLimits::default();
        for i in 0..1000 {
            assert!(limits.check(i).is_ok());
        }
    }

    #[test]
    fn test_cancel_token_trips_on_poll() {
        let token = CancelToken::new();
        let limits = SearchLimits::default().with_cancel(token.clone());
        assert!(limits.poll().is_ok());
        token.cancel();
        assert!(matches!(limits.poll(), Err(Error::Cancelled(_))));
    }

    #[test]
    fn test_expansion_budget() {
        let limits = SearchLimits::default().with_max_expansions(3);
        assert!(limits.check(3).is_ok());
        assert!(matches!(limits.check(4), Err(Error::Cancelled(_))));
    }

    #[test]
    fn test_expired_deadline() {
        let limits = SearchLimits::default().with_timeout(Duration::ZERO);
        assert!(matches!(limits.poll(), Err(Error::Cancelled(_))));
    }
}
