//! Log-distance path-loss model.
//!
//! `distance = 10^((reference_power - strength) / (10 * exponent))`

use serde::{Deserialize, Serialize};
use crate::model::Reading;

/// Smallest distance the model will report, in meters.
pub const MIN_DISTANCE_M: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathLossModel {
    /// Expected strength at 1 m (dBm).
    pub reference_power: f64,
    pub path_loss_exponent: f64,
}

impl Default for PathLossModel {
    fn default() -> Self {
        Self {
            reference_power: crate::config::DEFAULT_REFERENCE_POWER,
            path_loss_exponent: crate::config::DEFAULT_PATH_LOSS_EXPONENT,
        }
    }
}

impl PathLossModel {
    /// The model for one reading: its own calibration where present and
    /// usable, these defaults otherwise.
    pub fn for_reading(&self, reading: &Reading) -> PathLossModel {
        let reference_power = reading
            .reference_power
            .filter(|p| p.is_finite())
            .unwrap_or(self.reference_power);
        let path_loss_exponent = reading
            .path_loss_exponent
            .filter(|n| n.is_finite() && *n > 0.0)
            .unwrap_or(self.path_loss_exponent);
        PathLossModel { reference_power, path_loss_exponent }
    }

    /// Estimated distance in meters, never below [`MIN_DISTANCE_M`].
    ///
    /// Non-negative or non-finite strengths are not physical readings and
    /// map to the floor.
    pub fn distance(&self, strength: f64) -> f64 {
        if !strength.is_finite() || strength >= 0.0 {
            return MIN_DISTANCE_M;
        }
        let exponent = (self.reference_power - strength) / (10.0 * self.path_loss_exponent);
        let d = 10f64.powf(exponent);
        if d.is_finite() { d.max(MIN_DISTANCE_M) } else { MIN_DISTANCE_M }
    }

    /// Inverse of [`distance`](Self::distance): the strength expected at `meters`.
    pub fn strength_at(&self, meters: f64) -> f64 {
        self.reference_power - 10.0 * self.path_loss_exponent * meters.max(MIN_DISTANCE_M).log10()
    }
}
