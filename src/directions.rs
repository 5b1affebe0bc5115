//! Turn-by-turn directions from an ordered node sequence.
//!
//! Headings use the usual mathematical orientation (x right, y up), so a
//! positive change of heading is a left turn.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::Node;

/// Classification of the manoeuvre at a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TurnKind {
    Depart,
    Straight,
    SlightLeft,
    SlightRight,
    Left,
    Right,
    UTurn,
    Arrive,
}

impl TurnKind {
    /// Classify a signed heading change in degrees, normalised to (-180, 180].
    pub fn from_angle(delta_deg: f64) -> Self {
        let magnitude = delta_deg.abs();
        let left = delta_deg > 0.0;
        if magnitude < STRAIGHT_MAX_DEG {
            TurnKind::Straight
        } else if magnitude < SLIGHT_MAX_DEG {
            if left { TurnKind::SlightLeft } else { TurnKind::SlightRight }
        } else if magnitude <= TURN_MAX_DEG {
            if left { TurnKind::Left } else { TurnKind::Right }
        } else {
            TurnKind::UTurn
        }
    }
}

/// One instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub text: String,
    /// Meters walked after this instruction, before the next one.
    pub distance_m: f64,
    pub turn_kind: TurnKind,
}

const STRAIGHT_MAX_DEG: f64 = 20.0;
const SLIGHT_MAX_DEG: f64 = 60.0;
const TURN_MAX_DEG: f64 = 160.0;
/// Straight steps shorter than this are folded into the next instruction.
const MIN_STRAIGHT_STEP_M: f64 = 2.0;
/// Legs shorter than this have no usable heading.
const DEGENERATE_LEG_M: f64 = 1e-6;

/// Generate directions for a walked node sequence.
///
/// The first step is always `Depart` and the last always `Arrive`. The sum of
/// step distances equals the geometric length of the sequence; distances of
/// suppressed micro-steps are carried into the following instruction.
pub fn generate_directions(nodes: &[Node], pixels_per_meter: f64) -> Vec<Step> {
    let scale = if pixels_per_meter.is_finite() && pixels_per_meter > 0.0 {
        pixels_per_meter
    } else {
        debug!(pixels_per_meter, "unusable scale for directions, using 1 px/m");
        1.0
    };

    let Some(last) = nodes.last() else {
        return Vec::new();
    };
    if nodes.len() == 1 {
        return vec![arrive_step(last, 0.0)];
    }

    let legs: Vec<f64> = nodes.windows(2).map(|w| w[0].pixel_distance(&w[1]) / scale).collect();
    let headings = leg_headings(nodes);

    let mut steps = Vec::with_capacity(nodes.len());
    steps.push(Step {
        text: format!(
            "Start at {} and head toward {} for {}",
            nodes[0].display_name(),
            nodes[1].display_name(),
            format_distance(legs[0])
        ),
        distance_m: legs[0],
        turn_kind: TurnKind::Depart,
    });

    let mut carried = 0.0;
    for i in 1..nodes.len() - 1 {
        let turn = TurnKind::from_angle(normalize_degrees(headings[i] - headings[i - 1]));
        let distance = legs[i] + carried;
        if turn == TurnKind::Straight && distance < MIN_STRAIGHT_STEP_M {
            carried = distance;
            continue;
        }
        carried = 0.0;
        steps.push(Step {
            text: turn_text(turn, &nodes[i], &nodes[i + 1], distance),
            distance_m: distance,
            turn_kind: turn,
        });
    }

    steps.push(arrive_step(last, carried));
    steps
}

/// Human-friendly distance: exact meter below 20 m, nearest 5 m above.
pub fn format_distance(meters: f64) -> String {
    if !meters.is_finite() || meters < 0.5 {
        return "a few steps".to_string();
    }
    let rounded = if meters < 20.0 {
        meters.round()
    } else {
        (meters / 5.0).round() * 5.0
    };
    format!("{rounded:.0} m")
}

/// Sum of step distances.
pub fn total_distance(steps: &[Step]) -> f64 {
    steps.iter().map(|s| s.distance_m).sum()
}

/// Heading (degrees) of each leg. Zero-length legs inherit the previous
/// heading, or the next usable one when they lead the sequence.
fn leg_headings(nodes: &[Node]) -> Vec<f64> {
    let raw: Vec<Option<f64>> = nodes
        .windows(2)
        .map(|w| {
            let dx = w[1].x - w[0].x;
            let dy = w[1].y - w[0].y;
            (dx.hypot(dy) > DEGENERATE_LEG_M).then(|| dy.atan2(dx).to_degrees())
        })
        .collect();

    let first_known = raw.iter().flatten().next().copied().unwrap_or(0.0);
    let mut previous = first_known;
    raw.into_iter()
        .map(|h| {
            let heading = h.unwrap_or(previous);
            previous = heading;
            heading
        })
        .collect()
}

/// Normalise an angle in degrees to (-180, 180].
fn normalize_degrees(mut deg: f64) -> f64 {
    deg %= 360.0;
    if deg > 180.0 {
        deg -= 360.0;
    } else if deg <= -180.0 {
        deg += 360.0;
    }
    deg
}

fn turn_text(turn: TurnKind, at: &Node, toward: &Node, distance: f64) -> String {
    let at = at.display_name();
    let toward = toward.display_name();
    let dist = format_distance(distance);
    match turn {
        TurnKind::Straight => format!("Continue straight past {at} for {dist} toward {toward}"),
        TurnKind::SlightLeft => format!("At {at}, bear slightly left and continue {dist} toward {toward}"),
        TurnKind::SlightRight => format!("At {at}, bear slightly right and continue {dist} toward {toward}"),
        TurnKind::Left => format!("At {at}, turn left and continue {dist} toward {toward}"),
        TurnKind::Right => format!("At {at}, turn right and continue {dist} toward {toward}"),
        TurnKind::UTurn => format!("At {at}, turn around and continue {dist} toward {toward}"),
        TurnKind::Depart | TurnKind::Arrive => format!("Continue {dist} toward {toward}"),
    }
}

fn arrive_step(node: &Node, distance: f64) -> Step {
    Step {
        text: format!("Arrive at {}", node.display_name()),
        distance_m: distance,
        turn_kind: TurnKind::Arrive,
    }
}
