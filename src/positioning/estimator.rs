//! Position estimation from anchor readings.

use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::model::{Anchor, AnchorId, EstimateMethod, PositionEstimate, Reading};
use super::path_loss::{MIN_DISTANCE_M, PathLossModel};

/// Accuracy radius never exceeds this, in meters.
pub const MAX_ACCURACY_M: f64 = 20.0;
/// Normal-equation determinant, relative to the product of the diagonal
/// once that exceeds 1, below which anchors are treated as collinear.
const SINGULAR_DET: f64 = 1e-10;

/// A reading resolved against its anchor.
#[derive(Debug, Clone, Copy)]
struct Measurement {
    x: f64,
    y: f64,
    /// Estimated range in anchor coordinate units.
    range: f64,
    /// Estimated range in meters.
    range_m: f64,
}

/// Estimator settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionEstimator {
    /// Calibration used when a reading carries none.
    pub model: PathLossModel,
    /// Readings past this count are ignored.
    pub max_readings: usize,
    /// Anchor coordinate units per meter (1.0 when anchors are in meters).
    pub units_per_meter: f64,
}

impl Default for PositionEstimator {
    fn default() -> Self {
        Self {
            model: PathLossModel::default(),
            max_readings: crate::config::DEFAULT_MAX_READINGS,
            units_per_meter: 1.0,
        }
    }
}

/// Estimate with default settings. `None` when no reading resolves to a
/// known anchor.
pub fn estimate_position(readings: &[Reading], anchors: &[Anchor]) -> Option<PositionEstimate> {
    PositionEstimator::default().estimate(readings, anchors)
}

impl PositionEstimator {
    pub fn estimate(&self, readings: &[Reading], anchors: &[Anchor]) -> Option<PositionEstimate> {
        let by_id: HashMap<&AnchorId, &Anchor> = anchors.iter().map(|a| (&a.id, a)).collect();
        let scale = if self.units_per_meter.is_finite() && self.units_per_meter > 0.0 {
            self.units_per_meter
        } else {
            1.0
        };

        if readings.len() > self.max_readings {
            debug!(count = readings.len(), max = self.max_readings, "truncating readings");
        }
        let measurements: Vec<Measurement> = readings
            .iter()
            .take(self.max_readings)
            .filter_map(|r| {
                let Some(anchor) = by_id.get(&r.anchor_id) else {
                    warn!(anchor = %r.anchor_id, "reading for unknown anchor ignored");
                    return None;
                };
                let range_m = self.model.for_reading(r).distance(r.signal_strength);
                Some(Measurement { x: anchor.x, y: anchor.y, range: range_m * scale, range_m })
            })
            .collect();

        match measurements.len() {
            0 => None,
            1 => {
                let m = measurements[0];
                Some(PositionEstimate {
                    x: m.x,
                    y: m.y,
                    accuracy_m: m.range_m.min(MAX_ACCURACY_M),
                    method: EstimateMethod::SingleAnchor,
                })
            }
            2 => Some(weighted_centroid(&measurements)),
            _ => Some(trilaterate(&measurements, scale).unwrap_or_else(|| {
                debug!(anchors = measurements.len(), "degenerate anchor geometry, using weighted centroid");
                weighted_centroid(&measurements)
            })),
        }
    }
}

/// Inverse-distance weighted mean of anchor positions.
fn weighted_centroid(measurements: &[Measurement]) -> PositionEstimate {
    let mut total_weight = 0.0;
    let mut weighted_x = 0.0;
    let mut weighted_y = 0.0;
    for m in measurements {
        let w = 1.0 / m.range_m.max(MIN_DISTANCE_M);
        weighted_x += w * m.x;
        weighted_y += w * m.y;
        total_weight += w;
    }
    let mean_range = measurements.iter().map(|m| m.range_m).sum::<f64>() / measurements.len() as f64;
    PositionEstimate {
        x: weighted_x / total_weight,
        y: weighted_y / total_weight,
        accuracy_m: (mean_range * 0.5).min(MAX_ACCURACY_M),
        method: EstimateMethod::WeightedCentroid,
    }
}

/// Linearised least squares against the first measurement.
///
/// Whether the symmetric normal matrix `[[a00, a01], [a01, a11]]` is too
/// close to singular to invert. Below unit scale the bound is the absolute
/// `SINGULAR_DET`; above it the bound grows with `a00 * a11`, so plan-pixel
/// coordinates are judged by the same geometry as meters.
fn is_singular(a00: f64, a01: f64, a11: f64) -> bool {
    let det = a00 * a11 - a01 * a01;
    !det.is_finite() || det.abs() < SINGULAR_DET * (a00 * a11).max(1.0)
}

/// Subtracting the reference circle `(x-x0)² + (y-y0)² = r0²` from each other
/// circle leaves `2(xi-x0)x + 2(yi-y0)y = r0² - ri² + xi² - x0² + yi² - y0²`,
/// solved via the 2x2 normal equations. Returns `None` for near-singular
/// geometry or a non-finite solution.
fn trilaterate(measurements: &[Measurement], scale: f64) -> Option<PositionEstimate> {
    let reference = measurements[0];
    let (mut a00, mut a01, mut a11) = (0.0, 0.0, 0.0);
    let (mut b0, mut b1) = (0.0, 0.0);

    for m in &measurements[1..] {
        let ax = 2.0 * (m.x - reference.x);
        let ay = 2.0 * (m.y - reference.y);
        let rhs = reference.range.powi(2) - m.range.powi(2)
            + m.x.powi(2) - reference.x.powi(2)
            + m.y.powi(2) - reference.y.powi(2);
        a00 += ax * ax;
        a01 += ax * ay;
        a11 += ay * ay;
        b0 += ax * rhs;
        b1 += ay * rhs;
    }

    if is_singular(a00, a01, a11) {
        return None;
    }
    let det = a00 * a11 - a01 * a01;
    let x = (a11 * b0 - a01 * b1) / det;
    let y = (a00 * b1 - a01 * b0) / det;
    if !(x.is_finite() && y.is_finite()) {
        return None;
    }

    let mean_sq = measurements
        .iter()
        .map(|m| {
            let residual = ((x - m.x).hypot(y - m.y) - m.range) / scale;
            residual * residual
        })
        .sum::<f64>()
        / measurements.len() as f64;
    let rms = mean_sq.sqrt();

    Some(PositionEstimate {
        x,
        y,
        accuracy_m: if rms.is_finite() { rms.min(MAX_ACCURACY_M) } else { MAX_ACCURACY_M },
        method: EstimateMethod::Trilateration,
    })
}
