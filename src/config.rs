//! Tunables for routing, tour optimisation and positioning.
//!
//! ```rust
//! use venue_nav::NavConfig;
//!
//! let config = NavConfig::from_json(r#"{ "pixels_per_meter": 25.0, "max_expansions": 100000 }"#)?;
//! assert_eq!(config.max_stops, 50);
//! # Ok::<(), venue_nav::Error>(())
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::positioning::{PathLossModel, PositionEstimator};
use crate::routing::{RouteOptions, SearchLimits, TourOptions};
use crate::{Error, Result};

pub const DEFAULT_PIXELS_PER_METER: f64 = 10.0;
pub const DEFAULT_MAX_STOPS: usize = 50;
pub const DEFAULT_TWO_OPT_MAX_STOPS: usize = 15;
pub const DEFAULT_MAX_READINGS: usize = 20;
/// dBm at 1 m.
pub const DEFAULT_REFERENCE_POWER: f64 = -59.0;
pub const DEFAULT_PATH_LOSS_EXPONENT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Floor-plan scale.
    pub pixels_per_meter: f64,
    pub max_stops: usize,
    pub two_opt_max_stops: usize,
    pub max_readings: usize,
    pub reference_power: f64,
    pub path_loss_exponent: f64,
    /// Cost in meters added per vertical-transport hop.
    pub floor_transfer_cost_m: f64,
    pub max_expansions: Option<usize>,
    pub search_timeout_ms: Option<u64>,
    /// Anchor coordinate units per meter.
    pub anchor_units_per_meter: f64,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            pixels_per_meter: DEFAULT_PIXELS_PER_METER,
            max_stops: DEFAULT_MAX_STOPS,
            two_opt_max_stops: DEFAULT_TWO_OPT_MAX_STOPS,
            max_readings: DEFAULT_MAX_READINGS,
            reference_power: DEFAULT_REFERENCE_POWER,
            path_loss_exponent: DEFAULT_PATH_LOSS_EXPONENT,
            floor_transfer_cost_m: 0.0,
            max_expansions: None,
            search_timeout_ms: None,
            anchor_units_per_meter: 1.0,
        }
    }
}

impl NavConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: NavConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(Error::InvalidInput(format!("{name} must be positive and finite, got {v}")))
            }
        };
        positive("pixels_per_meter", self.pixels_per_meter)?;
        positive("path_loss_exponent", self.path_loss_exponent)?;
        positive("anchor_units_per_meter", self.anchor_units_per_meter)?;
        if !self.reference_power.is_finite() {
            return Err(Error::InvalidInput("reference_power must be finite".into()));
        }
        if !(self.floor_transfer_cost_m.is_finite() && self.floor_transfer_cost_m >= 0.0) {
            return Err(Error::InvalidInput(format!(
                "floor_transfer_cost_m must be non-negative, got {}",
                self.floor_transfer_cost_m
            )));
        }
        if self.max_stops == 0 || self.max_readings == 0 {
            return Err(Error::InvalidInput("max_stops and max_readings must be at least 1".into()));
        }
        Ok(())
    }

    /// Routing options for one call. The deadline, if any, starts now.
    pub fn route_options(&self, accessible_only: bool) -> RouteOptions {
        let mut limits = SearchLimits::default();
        if let Some(max) = self.max_expansions {
            limits = limits.with_max_expansions(max);
        }
        if let Some(ms) = self.search_timeout_ms {
            limits = limits.with_timeout(Duration::from_millis(ms));
        }
        RouteOptions {
            accessible_only,
            pixels_per_meter: self.pixels_per_meter,
            floor_transfer_cost_m: self.floor_transfer_cost_m,
            limits,
        }
    }

    pub fn tour_options(&self) -> TourOptions {
        TourOptions {
            max_stops: self.max_stops,
            two_opt_max_stops: self.two_opt_max_stops,
        }
    }

    pub fn estimator(&self) -> PositionEstimator {
        PositionEstimator {
            model: PathLossModel {
                reference_power: self.reference_power,
                path_loss_exponent: self.path_loss_exponent,
            },
            max_readings: self.max_readings,
            units_per_meter: self.anchor_units_per_meter,
        }
    }
}
