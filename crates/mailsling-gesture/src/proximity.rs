//! Pure proximity evaluation.
//!
//! [`evaluate`] maps one pointer sample to a ball position and per-target
//! readings. It is a function of its arguments and nothing else: no clocks,
//! no stored state, no side effects. Because it has no memory it also has
//! no opinion on whether a target *fired*; deciding that an arrival is new
//! is the activation guard's job.

use crate::config::{TargetId, TargetKind, TriageConfig};

/// Ball-relative reading for one configured target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetProximity {
    /// Target this reading refers to.
    pub id: TargetId,
    /// Action kind of the target, carried so consumers can render or
    /// dispatch without a second config lookup.
    pub kind: TargetKind,
    /// Absolute ball-to-target distance along the axis.
    pub distance: f32,
    /// Normalized closeness: 0 on the target, ramping to 1 at or beyond
    /// the target's near distance. Drives magnetic pull and glow.
    pub proximity: f32,
}

/// Result of evaluating one pointer sample against a configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityFrame {
    /// Finger displacement since the drag origin.
    pub delta: f32,
    /// Ball position after applying travel and clamping.
    pub ball_x: f32,
    /// Absolute distance from the ball to the resting position.
    pub distance_to_center: f32,
    /// Per-target readings, in configuration order.
    pub readings: Vec<TargetProximity>,
    /// Target whose activation zone contains the ball, if any.
    pub active_target: Option<TargetId>,
}

impl ProximityFrame {
    /// Reading for one target, if configured.
    #[must_use]
    pub fn reading(&self, id: TargetId) -> Option<&TargetProximity> {
        self.readings.iter().find(|r| r.id == id)
    }
}

/// Evaluates one pointer sample.
///
/// The ball position is `center + (current_x - origin) * travel_multiplier`,
/// clamped to the configured range. When activation zones overlap, the
/// target with the smaller activation distance wins.
#[must_use]
pub fn evaluate(config: &TriageConfig, origin: f32, current_x: f32) -> ProximityFrame {
    let delta = current_x - origin;
    let ball_x = delta
        .mul_add(config.travel_multiplier, config.center)
        .clamp(config.min_x, config.max_x);

    let readings = config
        .targets
        .iter()
        .map(|target| {
            let distance = target.distance_to(ball_x);
            TargetProximity {
                id: target.id,
                kind: target.kind,
                distance,
                proximity: (distance / target.near_distance).clamp(0.0, 1.0),
            }
        })
        .collect();

    ProximityFrame {
        delta,
        ball_x,
        distance_to_center: (ball_x - config.center).abs(),
        readings,
        active_target: config.active_target(ball_x).map(|t| t.id),
    }
}
