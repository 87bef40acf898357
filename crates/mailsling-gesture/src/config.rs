//! Target geometry and interaction tuning.
//!
//! Everything the proximity engine and the activation guard know about the
//! screen is plain data: where each target sits on the drag axis, how close
//! the ball must come to fire it, and how far the ball travels per pixel of
//! finger movement. Targets are fixed for the lifetime of a screen and are
//! defined here, never derived from layout measurements.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Identifier of a configured target, unique within one [`TriageConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TargetId(pub u8);

impl TargetId {
    /// Creates a target id from its raw value.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Raw value of this id.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for TargetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of action a target stands for.
///
/// The gesture layer treats kinds as opaque labels; `mailsling-core` maps
/// them to triage actions when an activation is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// Archive the email as handled.
    Done,
    /// File the email for a later reply.
    Reply,
    /// Start a voice reply.
    Mic,
    /// Unsubscribe from the sender.
    Unsubscribe,
}

impl TargetKind {
    /// Stable lowercase name, matching the wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::Reply => "reply",
            Self::Mic => "mic",
            Self::Unsubscribe => "unsubscribe",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fixed activation point on the drag axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Target {
    /// Identifier referenced by guard state and activation events.
    pub id: TargetId,
    /// Action kind this target stands for.
    pub kind: TargetKind,
    /// Position along the drag axis, in the same coordinate space as
    /// [`TriageConfig::center`].
    pub axis_position: f32,
    /// Ball-to-target distance at or below which the target fires.
    pub activation_distance: f32,
    /// Distance over which the proximity reading ramps from 1 (far) down
    /// to 0 (on the target).
    pub near_distance: f32,
}

impl Target {
    /// Absolute distance from a ball position to this target.
    #[must_use]
    pub fn distance_to(&self, ball_x: f32) -> f32 {
        (ball_x - self.axis_position).abs()
    }

    /// Whether a ball position falls inside this target's activation zone.
    #[must_use]
    pub fn contains(&self, ball_x: f32) -> bool {
        self.distance_to(ball_x) <= self.activation_distance
    }
}

/// Tuning for the drag-ball triage interaction.
///
/// The [`Default`] values are the shipped product tuning; tests and the
/// replay tool construct their own geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    /// Resting position of the ball on the drag axis.
    pub center: f32,
    /// Ball movement per pixel of finger movement.
    pub travel_multiplier: f32,
    /// Leftmost position the ball can reach.
    pub min_x: f32,
    /// Rightmost position the ball can reach.
    pub max_x: f32,
    /// Distance from center below which a post-activation cooldown re-arms.
    pub reset_threshold: f32,
    /// Configured targets, in rendering order.
    pub targets: Vec<Target>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            center: 0.0,
            travel_multiplier: 1.5,
            min_x: -520.0,
            max_x: 520.0,
            reset_threshold: 30.0,
            targets: vec![
                Target {
                    id: TargetId::new(0),
                    kind: TargetKind::Reply,
                    axis_position: -240.0,
                    activation_distance: 120.0,
                    near_distance: 80.0,
                },
                Target {
                    id: TargetId::new(1),
                    kind: TargetKind::Done,
                    axis_position: 240.0,
                    activation_distance: 120.0,
                    near_distance: 80.0,
                },
                Target {
                    id: TargetId::new(2),
                    kind: TargetKind::Mic,
                    axis_position: -440.0,
                    activation_distance: 70.0,
                    near_distance: 80.0,
                },
                Target {
                    id: TargetId::new(3),
                    kind: TargetKind::Unsubscribe,
                    axis_position: 440.0,
                    activation_distance: 70.0,
                    near_distance: 80.0,
                },
            ],
        }
    }
}

impl TriageConfig {
    /// Checks the configuration for contradictions.
    ///
    /// Overlapping activation zones are tolerated (the tighter zone wins at
    /// evaluation time) but logged, since they usually indicate a layout
    /// mistake.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.targets.is_empty() {
            return Err(ConfigError::NoTargets);
        }
        if self.min_x >= self.max_x {
            return Err(ConfigError::InvalidRange {
                min: self.min_x,
                max: self.max_x,
            });
        }
        if self.center < self.min_x || self.center > self.max_x {
            return Err(ConfigError::CenterOutOfRange {
                center: self.center,
                min: self.min_x,
                max: self.max_x,
            });
        }
        if self.travel_multiplier <= 0.0 {
            return Err(ConfigError::NonPositiveTravel(self.travel_multiplier));
        }
        if self.reset_threshold <= 0.0 {
            return Err(ConfigError::NonPositiveReset(self.reset_threshold));
        }

        let mut seen = std::collections::HashSet::new();
        for target in &self.targets {
            if !seen.insert(target.id) {
                return Err(ConfigError::DuplicateTarget(target.id));
            }
            if target.activation_distance <= 0.0 {
                return Err(ConfigError::NonPositiveActivation {
                    id: target.id,
                    value: target.activation_distance,
                });
            }
            if target.near_distance <= 0.0 {
                return Err(ConfigError::NonPositiveNear {
                    id: target.id,
                    value: target.near_distance,
                });
            }
            if target.axis_position < self.min_x || target.axis_position > self.max_x {
                return Err(ConfigError::UnreachableTarget {
                    id: target.id,
                    position: target.axis_position,
                    min: self.min_x,
                    max: self.max_x,
                });
            }
        }

        for (i, a) in self.targets.iter().enumerate() {
            for b in &self.targets[i + 1..] {
                let gap = (a.axis_position - b.axis_position).abs();
                if gap < a.activation_distance + b.activation_distance {
                    warn!(
                        first = %a.id,
                        second = %b.id,
                        gap,
                        "activation zones overlap; the tighter zone wins"
                    );
                }
            }
        }

        if let Some(id) = self.resting_target()
            && let Some(target) = self.target(id)
            && target.activation_distance < self.reset_threshold
        {
            warn!(
                %id,
                "resting target zone is tighter than the reset threshold; \
                 a post-activation re-arm can land outside it and fire"
            );
        }

        Ok(())
    }

    /// Target whose activation zone contains `ball_x`, if any.
    ///
    /// When zones overlap, the target with the smaller activation distance
    /// wins; ties break toward the closer target.
    #[must_use]
    pub fn active_target(&self, ball_x: f32) -> Option<&Target> {
        self.targets
            .iter()
            .filter(|t| t.contains(ball_x))
            .min_by(|a, b| {
                a.activation_distance
                    .total_cmp(&b.activation_distance)
                    .then(a.distance_to(ball_x).total_cmp(&b.distance_to(ball_x)))
            })
    }

    /// Target whose activation zone contains the resting ball, if any.
    ///
    /// The activation guard treats this target as "already fired" whenever
    /// it re-arms, so a target sitting on the resting position can only
    /// fire after the ball has genuinely left and come back.
    #[must_use]
    pub fn resting_target(&self) -> Option<TargetId> {
        self.active_target(self.center).map(|t| t.id)
    }

    /// Looks up a target by id.
    #[must_use]
    pub fn target(&self, id: TargetId) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == id)
    }
}

/// Contradictions detectable in a [`TriageConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// The target list is empty.
    #[error("no targets configured")]
    NoTargets,

    /// Two targets share an id.
    #[error("duplicate target id {0}")]
    DuplicateTarget(TargetId),

    /// A target's activation distance is zero or negative.
    #[error("target {id} has non-positive activation distance {value}")]
    NonPositiveActivation {
        /// Offending target.
        id: TargetId,
        /// Configured distance.
        value: f32,
    },

    /// A target's near distance is zero or negative.
    #[error("target {id} has non-positive near distance {value}")]
    NonPositiveNear {
        /// Offending target.
        id: TargetId,
        /// Configured distance.
        value: f32,
    },

    /// The travel multiplier is zero or negative.
    #[error("travel multiplier must be positive, got {0}")]
    NonPositiveTravel(f32),

    /// The reset threshold is zero or negative.
    #[error("reset threshold must be positive, got {0}")]
    NonPositiveReset(f32),

    /// The ball range is empty or inverted.
    #[error("invalid ball range: min {min} is not below max {max}")]
    InvalidRange {
        /// Configured minimum.
        min: f32,
        /// Configured maximum.
        max: f32,
    },

    /// The resting position lies outside the ball range.
    #[error("center {center} is outside the ball range [{min}, {max}]")]
    CenterOutOfRange {
        /// Configured center.
        center: f32,
        /// Configured minimum.
        min: f32,
        /// Configured maximum.
        max: f32,
    },

    /// A target sits where the clamped ball can never reach it.
    #[error("target {id} at {position} is outside the ball range [{min}, {max}]")]
    UnreachableTarget {
        /// Offending target.
        id: TargetId,
        /// Configured axis position.
        position: f32,
        /// Configured minimum.
        min: f32,
        /// Configured maximum.
        max: f32,
    },
}
