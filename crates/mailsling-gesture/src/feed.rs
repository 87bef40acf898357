//! Pointer update feed.
//!
//! A single-slot publish/subscribe pair built on [`tokio::sync::watch`].
//! The input side publishes a snapshot of the tracker after each recorded
//! event; the decision side observes each published frame at most once and
//! in publication order. Under load intermediate frames coalesce, which is
//! fine because only the latest sample matters, and the `touch_seq` and
//! `pointer_down` fields let a consumer reconstruct any touch edges that
//! landed between two observations.

use tokio::sync::watch;

use crate::tracker::{GestureSample, GestureTracker};

/// One published snapshot of the tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerFrame {
    /// Publication sequence number, strictly increasing.
    pub seq: u64,
    /// Tracker touch sequence at capture time.
    pub touch_seq: u32,
    /// Whether a pointer was on the screen at capture time.
    pub pointer_down: bool,
    /// Latest sample at capture time.
    pub sample: GestureSample,
}

impl PointerFrame {
    fn capture(tracker: &GestureTracker, seq: u64) -> Self {
        Self {
            seq,
            touch_seq: tracker.touch_seq(),
            pointer_down: tracker.is_pointer_down(),
            sample: tracker.sample(),
        }
    }
}

/// Creates a connected publisher/subscription pair seeded with the
/// tracker's current state. The seed frame counts as already observed;
/// [`PointerUpdates::next`] resolves on the first publish after this call.
#[must_use]
pub fn pointer_feed(tracker: &GestureTracker) -> (PointerPublisher, PointerUpdates) {
    let (tx, rx) = watch::channel(PointerFrame::capture(tracker, 0));
    (PointerPublisher { tx, seq: 0 }, PointerUpdates { rx })
}

/// Publishing half of the feed. Lives on the input side.
#[derive(Debug)]
pub struct PointerPublisher {
    tx: watch::Sender<PointerFrame>,
    seq: u64,
}

impl PointerPublisher {
    /// Captures the tracker's current state and publishes it, replacing
    /// any frame not yet observed.
    pub fn publish(&mut self, tracker: &GestureTracker) {
        self.seq += 1;
        self.tx.send_replace(PointerFrame::capture(tracker, self.seq));
    }
}

/// Subscribing half of the feed.
///
/// Clones observe independently; each clone starts with the currently
/// published frame marked as seen.
#[derive(Debug, Clone)]
pub struct PointerUpdates {
    rx: watch::Receiver<PointerFrame>,
}

impl PointerUpdates {
    /// Waits for a frame published after the last one observed here.
    ///
    /// Returns `None` once the publisher is gone and every published frame
    /// has been observed.
    pub async fn next(&mut self) -> Option<PointerFrame> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Latest published frame, without consuming it. A peek for pollers;
    /// a subsequent [`Self::next`] can still return the same frame.
    #[must_use]
    pub fn latest(&self) -> PointerFrame {
        *self.rx.borrow()
    }

    /// Whether a frame is waiting that [`Self::next`] has not returned.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use tokio_test::{assert_pending, assert_ready, task};

    #[tokio::test]
    async fn test_next_sees_only_the_latest_frame() {
        let tracker = GestureTracker::new(0.0);
        let (mut publisher, mut updates) = pointer_feed(&tracker);

        tracker.record_touch_down(10.0);
        publisher.publish(&tracker);
        tracker.record_touch_move(20.0);
        publisher.publish(&tracker);
        tracker.record_touch_move(30.0);
        publisher.publish(&tracker);

        let frame = updates.next().await.unwrap();
        assert_eq!(frame.seq, 3);
        assert_eq!(frame.sample.x, 30.0);
    }

    #[tokio::test]
    async fn test_frames_are_observed_at_most_once() {
        let tracker = GestureTracker::new(0.0);
        let (mut publisher, mut updates) = pointer_feed(&tracker);

        tracker.record_touch_down(10.0);
        publisher.publish(&tracker);
        assert!(updates.next().await.is_some());

        let mut pending = task::spawn(updates.next());
        assert_pending!(pending.poll());

        publisher.publish(&tracker);
        assert!(pending.is_woken());
        let frame = assert_ready!(pending.poll()).unwrap();
        assert_eq!(frame.seq, 2);
    }

    #[tokio::test]
    async fn test_latest_is_a_peek() {
        let tracker = GestureTracker::new(0.0);
        let (mut publisher, mut updates) = pointer_feed(&tracker);

        tracker.record_touch_down(42.0);
        publisher.publish(&tracker);

        assert!(updates.has_pending());
        assert_eq!(updates.latest().sample.x, 42.0);
        // The peek did not consume the frame.
        assert_eq!(updates.next().await.unwrap().sample.x, 42.0);
        assert!(!updates.has_pending());
    }

    #[tokio::test]
    async fn test_pending_frame_survives_publisher_drop() {
        let tracker = GestureTracker::new(0.0);
        let (mut publisher, mut updates) = pointer_feed(&tracker);

        tracker.record_touch_down(7.0);
        publisher.publish(&tracker);
        drop(publisher);

        assert!(updates.next().await.is_some());
        assert!(updates.next().await.is_none());
    }

    #[tokio::test]
    async fn test_touch_edges_recoverable_after_coalescing() {
        let tracker = GestureTracker::new(0.0);
        let (mut publisher, mut updates) = pointer_feed(&tracker);

        tracker.record_touch_down(5.0);
        publisher.publish(&tracker);
        let first = updates.next().await.unwrap();
        assert_eq!(first.touch_seq, 1);
        assert!(first.pointer_down);

        // An up and a fresh down land before the consumer looks again.
        tracker.record_touch_up();
        publisher.publish(&tracker);
        tracker.record_touch_down(8.0);
        publisher.publish(&tracker);
        tracker.record_touch_move(12.0);
        publisher.publish(&tracker);

        let frame = updates.next().await.unwrap();
        // The missed edges are visible in the sequence jump.
        assert_eq!(frame.touch_seq, 2);
        assert!(frame.pointer_down);
        assert_eq!(frame.sample.x, 12.0);
    }
}
