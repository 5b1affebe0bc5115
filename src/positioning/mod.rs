//! Indoor positioning from radio signal readings.
//!
//! Readings are converted to ranges with a log-distance path-loss model and
//! combined according to how many anchors answered:
//!
//! | anchors | method |
//! |---------|--------|
//! | 0 | no estimate |
//! | 1 | anchor position, accuracy = range |
//! | 2 | inverse-range weighted centroid |
//! | 3+ | linear least-squares trilateration, centroid on degenerate geometry |

pub mod estimator;
pub mod path_loss;

pub use estimator::{estimate_position, PositionEstimator, MAX_ACCURACY_M};
pub use path_loss::{PathLossModel, MIN_DISTANCE_M};

/// Estimated distance in meters for one signal strength.
///
/// Unusable calibration values fall back to the defaults.
pub fn estimate_distance(signal_strength: f64, reference_power: f64, path_loss_exponent: f64) -> f64 {
    let defaults = PathLossModel::default();
    let model = PathLossModel {
        reference_power: if reference_power.is_finite() { reference_power } else { defaults.reference_power },
        path_loss_exponent: if path_loss_exponent.is_finite() && path_loss_exponent > 0.0 {
            path_loss_exponent
        } else {
            defaults.path_loss_exponent
        },
    };
    model.distance(signal_strength)
}
