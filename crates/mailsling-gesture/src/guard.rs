//! Activation guard.
//!
//! A drag is one continuous stream of positions; actions are discrete. The
//! moment a target fires, the dispatcher re-bases the drag origin so the
//! ball snaps home, and without a guard that snap is indistinguishable
//! from "the user dragged the ball onto whatever sits at center". The
//! guard is the state machine that separates a genuine arrival from the
//! mechanical consequences of the previous activation.
//!
//! The repeat gate opens as soon as the ball leaves the fired target's
//! zone, not only on the next touch-down. Lingering in a zone still fires
//! at most once, but a deliberate out-and-back inside one drag counts as a
//! new arrival, and a target resting under the centered ball becomes
//! reachable once the ball has visited somewhere else first.

use tracing::debug;

use crate::config::{TargetId, TargetKind, TriageConfig};
use crate::proximity::ProximityFrame;

/// Phase of the activation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivationPhase {
    /// No pointer on the screen.
    #[default]
    Idle,
    /// Pointer down and armed: entering a target fires it.
    Dragging,
    /// A target fired this instant. Pass-through: the guard moves on to
    /// [`Self::Cooldown`] inside the same evaluation, so this phase is
    /// never observed between calls.
    Activated,
    /// Waiting for the ball to come back near center before re-arming.
    Cooldown,
}

/// One confirmed, de-duplicated arrival at a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationEvent {
    /// Index of the row the action applies to, stamped at the instant the
    /// guard fired.
    pub row: usize,
    /// Target that fired.
    pub target: TargetId,
    /// Action kind of the fired target.
    pub kind: TargetKind,
}

/// State machine deciding whether an instant constitutes a new activation.
///
/// The guard owns three facts: the current phase, the target that most
/// recently fired (the repeat gate while the ball lingers in a zone), and
/// the identity of the target resting under a centered ball, if the
/// configuration has one. Re-arming points the repeat gate at that resting
/// target, so a post-activation snap to center can never fire it.
#[derive(Debug, Clone)]
pub struct ActivationGuard {
    phase: ActivationPhase,
    last_fired: Option<TargetId>,
    resting_marker: Option<TargetId>,
    reset_threshold: f32,
}

impl ActivationGuard {
    /// Creates a guard for the given geometry.
    #[must_use]
    pub fn new(config: &TriageConfig) -> Self {
        Self {
            phase: ActivationPhase::Idle,
            last_fired: None,
            resting_marker: config.resting_target(),
            reset_threshold: config.reset_threshold,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> ActivationPhase {
        self.phase
    }

    /// Target gated against repeat firing, if any.
    #[must_use]
    pub const fn last_fired(&self) -> Option<TargetId> {
        self.last_fired
    }

    /// Whether the next zone entry would fire.
    #[must_use]
    pub const fn is_armed(&self) -> bool {
        matches!(self.phase, ActivationPhase::Dragging)
    }

    /// Starts a drag. The repeat gate resets to the resting target so a
    /// target under the finger's starting position cannot fire from zero
    /// movement.
    pub fn on_touch_down(&mut self) {
        self.phase = ActivationPhase::Dragging;
        self.last_fired = self.resting_marker;
    }

    /// Ends the drag. No event can fire until the next touch-down.
    pub fn on_touch_up(&mut self) {
        self.phase = ActivationPhase::Idle;
    }

    /// Feeds one evaluated frame through the state machine.
    ///
    /// Returns an event exactly when the phase is [`ActivationPhase::Dragging`]
    /// and the ball sits in the activation zone of a target the repeat gate
    /// does not name. Firing passes through [`ActivationPhase::Activated`]
    /// into [`ActivationPhase::Cooldown`]; the guard re-arms once the ball
    /// returns within the reset threshold of center.
    pub fn evaluate(&mut self, frame: &ProximityFrame, active_row: usize) -> Option<ActivationEvent> {
        match self.phase {
            ActivationPhase::Idle => None,
            ActivationPhase::Dragging => match frame.active_target {
                None => {
                    // The gate only exists to stop repeats while the ball
                    // lingers; once it leaves the zone, the gate opens.
                    self.last_fired = None;
                    None
                }
                Some(id) if self.last_fired == Some(id) => None,
                Some(id) => {
                    let reading = frame.reading(id)?;
                    self.phase = ActivationPhase::Activated;
                    self.last_fired = Some(id);
                    let event = ActivationEvent {
                        row: active_row,
                        target: id,
                        kind: reading.kind,
                    };
                    debug!(
                        target_id = %id,
                        kind = %reading.kind,
                        row = active_row,
                        ball_x = frame.ball_x,
                        "target activated"
                    );
                    // Activated is a pass-through phase; the guard never
                    // rests there.
                    self.phase = ActivationPhase::Cooldown;
                    Some(event)
                }
            },
            ActivationPhase::Activated | ActivationPhase::Cooldown => {
                if frame.distance_to_center < self.reset_threshold {
                    self.phase = ActivationPhase::Dragging;
                    self.last_fired = self.resting_marker;
                    debug!(distance = frame.distance_to_center, "guard re-armed");
                }
                None
            }
        }
    }
}
