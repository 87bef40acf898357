//! Passive gesture capture.
//!
//! The tracker sits on the platform's capture-phase input path and records
//! every pointer event without ever claiming the gesture, so list scrolling
//! and the drag ball observe the same physical movement. Writes come from
//! the input thread; reads can happen from anywhere. Only the latest sample
//! matters, so the hot path is a single atomic slot rather than a queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

/// One pointer position sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureSample {
    /// Horizontal pointer position, in logical pixels.
    pub x: f32,
    /// Milliseconds since the tracker was created. Wraps after about 49
    /// days, far beyond the life of any screen.
    pub at_ms: u32,
}

impl GestureSample {
    fn pack(self) -> u64 {
        (u64::from(self.x.to_bits()) << 32) | u64::from(self.at_ms)
    }

    fn unpack(bits: u64) -> Self {
        Self {
            x: f32::from_bits((bits >> 32) as u32),
            at_ms: (bits & 0xFFFF_FFFF) as u32,
        }
    }
}

#[derive(Debug)]
struct TrackerShared {
    /// Packed [`GestureSample`]; position bits in the high half.
    slot: AtomicU64,
    /// Whether a pointer is currently on the screen.
    down: AtomicBool,
    /// Incremented once per touch-down, never reset. Lets a consumer that
    /// observes samples intermittently detect touch edges it slept through.
    touch_seq: AtomicU32,
    epoch: Instant,
    center_default: f32,
}

/// Lock-free single-slot cell holding the most recent pointer sample.
///
/// Cloning yields another handle to the same cell. All operations are
/// wait-free; the slot carries a single scalar and publishes no other
/// memory, so relaxed ordering is sufficient throughout.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    inner: Arc<TrackerShared>,
}

impl GestureTracker {
    /// Creates a tracker whose sample rests at `center_default` until the
    /// first touch arrives.
    #[must_use]
    pub fn new(center_default: f32) -> Self {
        let resting = GestureSample {
            x: center_default,
            at_ms: 0,
        };
        Self {
            inner: Arc::new(TrackerShared {
                slot: AtomicU64::new(resting.pack()),
                down: AtomicBool::new(false),
                touch_seq: AtomicU32::new(0),
                epoch: Instant::now(),
                center_default,
            }),
        }
    }

    fn now_ms(&self) -> u32 {
        u32::try_from(self.inner.epoch.elapsed().as_millis()).unwrap_or(u32::MAX)
    }

    fn store(&self, x: f32) {
        let sample = GestureSample {
            x,
            at_ms: self.now_ms(),
        };
        self.inner.slot.store(sample.pack(), Ordering::Relaxed);
    }

    /// Records a touch-down at `x` and opens a new touch sequence.
    pub fn record_touch_down(&self, x: f32) {
        self.inner.touch_seq.fetch_add(1, Ordering::Relaxed);
        self.inner.down.store(true, Ordering::Relaxed);
        self.store(x);
    }

    /// Records a pointer move to `x`. Never rejected; scroll consumers see
    /// the same event and the decision layer filters on its own terms.
    pub fn record_touch_move(&self, x: f32) {
        self.store(x);
    }

    /// Records the pointer leaving the screen. The sample snaps back to the
    /// resting position so late readers see a centered ball, not the last
    /// drag excursion.
    pub fn record_touch_up(&self) {
        self.inner.down.store(false, Ordering::Relaxed);
        self.store(self.inner.center_default);
    }

    /// Most recent sample.
    #[must_use]
    pub fn sample(&self) -> GestureSample {
        GestureSample::unpack(self.inner.slot.load(Ordering::Relaxed))
    }

    /// Position of the most recent sample.
    #[must_use]
    pub fn current_x(&self) -> f32 {
        self.sample().x
    }

    /// Whether a pointer is currently on the screen.
    #[must_use]
    pub fn is_pointer_down(&self) -> bool {
        self.inner.down.load(Ordering::Relaxed)
    }

    /// Number of touch-downs recorded so far.
    #[must_use]
    pub fn touch_seq(&self) -> u32 {
        self.inner.touch_seq.load(Ordering::Relaxed)
    }

    /// Resting position samples return to on touch-up.
    #[must_use]
    pub fn center_default(&self) -> f32 {
        self.inner.center_default
    }
}

/// Shared drag-origin cell.
///
/// The origin is the finger position the ball displacement is measured
/// from. It is captured at touch-down and re-captured by the dispatcher
/// the instant an action fires, which is what snaps the ball back to
/// center without anyone writing an absolute ball position.
#[derive(Debug, Clone)]
pub struct DragOrigin {
    inner: Arc<AtomicU32>,
}

impl DragOrigin {
    /// Creates an origin cell starting at `x`.
    #[must_use]
    pub fn new(x: f32) -> Self {
        Self {
            inner: Arc::new(AtomicU32::new(x.to_bits())),
        }
    }

    /// Re-bases the origin to `x`.
    pub fn capture(&self, x: f32) {
        self.inner.store(x.to_bits(), Ordering::Relaxed);
    }

    /// Current origin position.
    #[must_use]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.inner.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_rests_at_center_before_first_touch() {
        let tracker = GestureTracker::new(12.5);
        assert_eq!(tracker.current_x(), 12.5);
        assert!(!tracker.is_pointer_down());
        assert_eq!(tracker.touch_seq(), 0);
    }

    #[test]
    fn test_latest_sample_wins() {
        let tracker = GestureTracker::new(0.0);
        tracker.record_touch_down(10.0);
        tracker.record_touch_move(35.0);
        tracker.record_touch_move(-80.25);
        assert_eq!(tracker.current_x(), -80.25);
    }

    #[test]
    fn test_touch_up_resets_to_center() {
        let tracker = GestureTracker::new(5.0);
        tracker.record_touch_down(0.0);
        tracker.record_touch_move(-300.0);
        tracker.record_touch_up();
        assert_eq!(tracker.current_x(), 5.0);
        assert!(!tracker.is_pointer_down());
    }

    #[test]
    fn test_touch_seq_counts_downs_only() {
        let tracker = GestureTracker::new(0.0);
        tracker.record_touch_down(1.0);
        tracker.record_touch_move(2.0);
        tracker.record_touch_up();
        tracker.record_touch_down(3.0);
        assert_eq!(tracker.touch_seq(), 2);
    }

    #[test]
    fn test_clones_share_the_slot() {
        let writer = GestureTracker::new(0.0);
        let reader = writer.clone();
        writer.record_touch_down(42.0);
        assert_eq!(reader.current_x(), 42.0);
        assert!(reader.is_pointer_down());
    }

    #[test]
    fn test_pack_round_trip_preserves_negative_positions() {
        let sample = GestureSample {
            x: -123.456,
            at_ms: 987_654,
        };
        assert_eq!(GestureSample::unpack(sample.pack()), sample);
    }

    #[test]
    fn test_timestamps_do_not_go_backwards() {
        let tracker = GestureTracker::new(0.0);
        tracker.record_touch_down(1.0);
        let first = tracker.sample().at_ms;
        tracker.record_touch_move(2.0);
        assert!(tracker.sample().at_ms >= first);
    }

    #[test]
    fn test_origin_recapture() {
        let origin = DragOrigin::new(0.0);
        let other = origin.clone();
        origin.capture(-130.0);
        assert_eq!(other.get(), -130.0);
    }
}
