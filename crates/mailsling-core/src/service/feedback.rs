//! Haptic and sound cues.

/// Intensity of a feedback cue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackKind {
    /// Subtle tick, e.g. an action was accepted and is in flight.
    Light,
    /// Firmer tap, e.g. recording started.
    Medium,
    /// Positive confirmation, e.g. a mutation landed.
    Success,
}

/// Fire-and-forget sink for haptic or sound cues.
///
/// Implementations must return immediately and must not panic; a missed
/// cue is always preferable to a stalled triage flow.
pub trait FeedbackSink: Send + Sync {
    /// Emits one cue.
    fn feedback(&self, kind: FeedbackKind);
}

/// Sink that drops every cue. For tests and platforms without haptics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFeedback;

impl FeedbackSink for NoopFeedback {
    fn feedback(&self, _kind: FeedbackKind) {}
}
