//! The assembled triage engine.
//!
//! One value owning the whole pipeline: tracker, drag origin, proximity
//! geometry, activation guard, row bookkeeping, session store, and
//! dispatcher. The engine can be driven two ways: directly, by calling
//! the `touch_*` methods and [`TriageEngine::step`] from one thread, or
//! through the pointer feed with [`TriageEngine::run`], where the input
//! side holds a [`GestureTracker`] clone and a publisher while the engine
//! consumes frames.

use std::sync::Arc;

use tracing::warn;

use mailsling_gesture::feed::{PointerFrame, PointerUpdates};
use mailsling_gesture::{
    ActivationEvent, ActivationGuard, DragOrigin, GestureTracker, ProximityFrame, TriageConfig,
    proximity,
};

use crate::dispatch::{ActionDispatcher, DispatchOutcome, NoticeStream};
use crate::error::Error;
use crate::model::EmailRow;
use crate::rows::{RowIndexTracker, RowListHandle};
use crate::service::{Collaborators, FeedbackSink, NoopFeedback, TriageBackend, VoiceCollaborator};
use crate::session::TriageSessionStore;

/// Gesture-driven triage, assembled and ready to feed.
#[derive(Debug)]
pub struct TriageEngine {
    config: TriageConfig,
    tracker: GestureTracker,
    origin: DragOrigin,
    guard: ActivationGuard,
    rows: RowListHandle,
    row_index: RowIndexTracker,
    session: Arc<TriageSessionStore>,
    dispatcher: ActionDispatcher,
    /// Touch sequence of the last frame consumed via the feed.
    last_touch_seq: u32,
    pointer_was_down: bool,
}

impl TriageEngine {
    /// Starts building an engine around the two collaborators that have
    /// no meaningful default.
    #[must_use]
    pub fn builder(
        backend: Arc<dyn TriageBackend>,
        voice: Arc<dyn VoiceCollaborator>,
    ) -> TriageEngineBuilder {
        TriageEngineBuilder {
            config: TriageConfig::default(),
            rows: Vec::new(),
            backend,
            voice,
            feedback: Arc::new(NoopFeedback),
        }
    }

    /// Records a touch-down at `x` and arms the guard.
    pub fn touch_down(&mut self, x: f32) {
        self.tracker.record_touch_down(x);
        self.origin.capture(x);
        self.guard.on_touch_down();
        self.last_touch_seq = self.tracker.touch_seq();
        self.pointer_was_down = true;
    }

    /// Records a pointer move to `x`.
    pub fn touch_move(&mut self, x: f32) {
        self.tracker.record_touch_move(x);
    }

    /// Records the pointer leaving the screen.
    pub fn touch_up(&mut self) {
        self.tracker.record_touch_up();
        self.guard.on_touch_up();
        self.pointer_was_down = false;
    }

    /// Evaluates the current tracker state through the guard.
    #[must_use]
    pub fn process(&mut self) -> Option<ActivationEvent> {
        self.evaluate_at(self.tracker.current_x())
    }

    /// Geometry of the current instant, for rendering the ball and the
    /// target glows.
    #[must_use]
    pub fn current_frame(&self) -> ProximityFrame {
        proximity::evaluate(&self.config, self.origin.get(), self.tracker.current_x())
    }

    /// Settles one activation through the dispatcher.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Voice`] when the mic target could not start
    /// recording; backend failures settle into notices instead.
    pub async fn dispatch(&self, event: &ActivationEvent) -> Result<DispatchOutcome, Error> {
        self.dispatcher.on_activation(event).await
    }

    /// [`Self::process`] and, when something fired, [`Self::dispatch`].
    ///
    /// # Errors
    ///
    /// Propagates [`Self::dispatch`] errors.
    pub async fn step(&mut self) -> Result<Option<DispatchOutcome>, Error> {
        match self.process() {
            Some(event) => self.dispatch(&event).await.map(Some),
            None => Ok(None),
        }
    }

    /// Consumes one published frame: reconstructs any touch edges that
    /// coalesced away, then evaluates and dispatches.
    ///
    /// # Errors
    ///
    /// Propagates [`Self::dispatch`] errors.
    pub async fn on_frame(&mut self, frame: &PointerFrame) -> Result<Option<DispatchOutcome>, Error> {
        if frame.touch_seq != self.last_touch_seq {
            // One or more touch-downs landed since the last observation.
            // Close the drag we thought was live, then open the new one
            // at the observed position.
            if self.pointer_was_down {
                self.guard.on_touch_up();
            }
            self.guard.on_touch_down();
            self.origin.capture(frame.sample.x);
            self.last_touch_seq = frame.touch_seq;
            self.pointer_was_down = true;
        }
        if self.pointer_was_down && !frame.pointer_down {
            self.guard.on_touch_up();
        }
        self.pointer_was_down = frame.pointer_down;
        if !frame.pointer_down {
            return Ok(None);
        }

        match self.evaluate_at(frame.sample.x) {
            Some(event) => self.dispatch(&event).await.map(Some),
            None => Ok(None),
        }
    }

    /// Consumes the feed until the publisher is gone.
    ///
    /// Dispatch failures do not stop the loop: mic failures degrade to a
    /// [`crate::TriageNotice::MicUnavailable`] notice, anything else is
    /// logged, and the next frame is consumed.
    pub async fn run(&mut self, mut updates: PointerUpdates) {
        while let Some(frame) = updates.next().await {
            match self.on_frame(&frame).await {
                Ok(_) => {}
                Err(Error::Voice(e)) => {
                    warn!("Mic target failed to start recording: {e}");
                    self.dispatcher.notify_mic_unavailable(e.to_string());
                }
                Err(e) => warn!("Dispatch failed: {e}"),
            }
        }
    }

    /// Handle for the input side; clones share the same slot.
    #[must_use]
    pub fn tracker(&self) -> GestureTracker {
        self.tracker.clone()
    }

    /// Shared session store, for list affordances and rendering.
    #[must_use]
    pub fn session(&self) -> Arc<TriageSessionStore> {
        Arc::clone(&self.session)
    }

    /// Shared row list, for refreshes.
    #[must_use]
    pub fn rows(&self) -> RowListHandle {
        self.rows.clone()
    }

    /// Active-row tracker, for the list's viewability reports.
    #[must_use]
    pub fn row_index(&self) -> RowIndexTracker {
        self.row_index.clone()
    }

    /// The dispatcher, for flows that outlive a single activation:
    /// calendar events, cancelling or finishing a recording.
    #[must_use]
    pub const fn dispatcher(&self) -> &ActionDispatcher {
        &self.dispatcher
    }

    /// The geometry this engine runs with.
    #[must_use]
    pub const fn config(&self) -> &TriageConfig {
        &self.config
    }

    fn evaluate_at(&mut self, x: f32) -> Option<ActivationEvent> {
        let frame = proximity::evaluate(&self.config, self.origin.get(), x);
        self.guard.evaluate(&frame, self.row_index.active_index())
    }
}

/// Builder for [`TriageEngine`].
pub struct TriageEngineBuilder {
    config: TriageConfig,
    rows: Vec<EmailRow>,
    backend: Arc<dyn TriageBackend>,
    voice: Arc<dyn VoiceCollaborator>,
    feedback: Arc<dyn FeedbackSink>,
}

impl TriageEngineBuilder {
    /// Replaces the default geometry.
    #[must_use]
    pub fn config(mut self, config: TriageConfig) -> Self {
        self.config = config;
        self
    }

    /// Seeds the row list.
    #[must_use]
    pub fn rows(mut self, rows: Vec<EmailRow>) -> Self {
        self.rows = rows;
        self
    }

    /// Replaces the default no-op feedback sink.
    #[must_use]
    pub fn feedback(mut self, feedback: Arc<dyn FeedbackSink>) -> Self {
        self.feedback = feedback;
        self
    }

    /// Validates the geometry and assembles the engine.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the geometry is contradictory.
    pub fn build(self) -> Result<(TriageEngine, NoticeStream), Error> {
        self.config.validate()?;

        let tracker = GestureTracker::new(self.config.center);
        let origin = DragOrigin::new(self.config.center);
        let guard = ActivationGuard::new(&self.config);
        let rows = RowListHandle::new(self.rows);
        let row_index = RowIndexTracker::new();
        let session = Arc::new(TriageSessionStore::new(
            Arc::clone(&self.backend),
            rows.clone(),
        ));
        let collaborators = Collaborators::new(self.backend, self.voice, self.feedback);
        let (dispatcher, notices) = ActionDispatcher::new(
            rows.clone(),
            row_index.clone(),
            Arc::clone(&session),
            collaborators,
            tracker.clone(),
            origin.clone(),
        );

        Ok((
            TriageEngine {
                config: self.config,
                tracker,
                origin,
                guard,
                rows,
                row_index,
                session,
                dispatcher,
                last_touch_seq: 0,
                pointer_was_down: false,
            },
            notices,
        ))
    }
}

impl std::fmt::Debug for TriageEngineBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriageEngineBuilder")
            .field("rows", &self.rows.len())
            .finish_non_exhaustive()
    }
}
