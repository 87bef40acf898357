//! End-to-end scenarios for the assembled triage engine.
//!
//! These tests drive the full pipeline (tracker, proximity, guard,
//! dispatcher, session store) against mock collaborators, with explicit
//! test geometry: travel 1.0, done at -200, reply at +200 (both
//! activation 120 / near 80), mic at -400 and unsubscribe at +400 (both
//! 60 / 60), reset threshold 30.

#![allow(clippy::unwrap_used)]

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{Notify, watch};

use mailsling_core::{
    ActionKind, BackendError, BatchItem, BatchOutcome, CalendarEventFields, CalendarEventLink,
    DispatchOutcome, EmailId, EmailRow, Error, TriageBackend, TriageDisposition, TriageEngine,
    TriageNotice, UnsubscribeOutcome, VoiceCollaborator, VoiceError,
};
use mailsling_gesture::feed::pointer_feed;
use mailsling_gesture::{ActivationEvent, Target, TargetId, TargetKind, TriageConfig};

const DONE: TargetId = TargetId(0);

fn geometry() -> TriageConfig {
    let target = |id: u8, kind, axis_position, activation_distance, near_distance| Target {
        id: TargetId::new(id),
        kind,
        axis_position,
        activation_distance,
        near_distance,
    };
    TriageConfig {
        center: 0.0,
        travel_multiplier: 1.0,
        min_x: -500.0,
        max_x: 500.0,
        reset_threshold: 30.0,
        targets: vec![
            target(0, TargetKind::Done, -200.0, 120.0, 80.0),
            target(1, TargetKind::Reply, 200.0, 120.0, 80.0),
            target(2, TargetKind::Mic, -400.0, 60.0, 60.0),
            target(3, TargetKind::Unsubscribe, 400.0, 60.0, 60.0),
        ],
    }
}

fn rows(ids: &[&str]) -> Vec<EmailRow> {
    ids.iter()
        .map(|id| EmailRow {
            id: EmailId::new(*id),
            subject: format!("About {id}"),
            sender: "someone@example.com".to_owned(),
            category: "inbox".to_owned(),
        })
        .collect()
}

fn event_fields() -> CalendarEventFields {
    CalendarEventFields {
        title: "Planning sync".to_owned(),
        starts_at: chrono::Utc::now(),
        ends_at: None,
        location: Some("Room 2".to_owned()),
    }
}

/// Backend that records calls, optionally rejects ids, optionally holds
/// each triage until released, and can fail with an auth error.
#[derive(Default)]
struct MockBackend {
    calls: Mutex<Vec<String>>,
    reject: HashSet<EmailId>,
    auth_expired: bool,
    manual_unsubscribe: bool,
    calendar_fails: bool,
    gate: Option<Notify>,
}

impl MockBackend {
    fn rejecting(ids: &[&str]) -> Self {
        Self {
            reject: ids.iter().copied().map(EmailId::new).collect(),
            ..Self::default()
        }
    }

    fn gated() -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::default()
        }
    }

    fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn triage_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.starts_with("triage "))
            .count()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl TriageBackend for MockBackend {
    async fn triage(
        &self,
        email_id: &EmailId,
        action: TriageDisposition,
    ) -> Result<(), BackendError> {
        self.log(format!("triage {email_id} {action}"));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.auth_expired {
            return Err(BackendError::Auth("session expired".to_owned()));
        }
        if self.reject.contains(email_id) {
            return Err(BackendError::Rejected("mock rejection".to_owned()));
        }
        Ok(())
    }

    async fn batch_triage(&self, items: &[BatchItem]) -> Result<BatchOutcome, BackendError> {
        self.log(format!("batch_triage {}", items.len()));
        Ok(BatchOutcome {
            triaged_count: items.len(),
            errors: Vec::new(),
        })
    }

    async fn untriage(&self, email_id: &EmailId) -> Result<(), BackendError> {
        self.log(format!("untriage {email_id}"));
        Ok(())
    }

    async fn batch_untriage(&self, email_ids: &[EmailId]) -> Result<(), BackendError> {
        self.log(format!("batch_untriage {}", email_ids.len()));
        Ok(())
    }

    async fn unsubscribe(&self, email_id: &EmailId) -> Result<UnsubscribeOutcome, BackendError> {
        self.log(format!("unsubscribe {email_id}"));
        if self.manual_unsubscribe {
            Ok(UnsubscribeOutcome::ManualRequired)
        } else {
            Ok(UnsubscribeOutcome::Completed)
        }
    }

    async fn add_calendar_event(
        &self,
        email_id: &EmailId,
        _event: &CalendarEventFields,
    ) -> Result<CalendarEventLink, BackendError> {
        self.log(format!("calendar {email_id}"));
        if self.calendar_fails {
            return Err(BackendError::Network("calendar service unreachable".to_owned()));
        }
        Ok(CalendarEventLink {
            url: "https://calendar.example/e/1".to_owned(),
        })
    }
}

/// Voice collaborator that records its lifecycle.
struct MockVoice {
    started: AtomicUsize,
    cancelled: AtomicBool,
    deny: bool,
    transcript: watch::Sender<String>,
}

impl MockVoice {
    fn new(deny: bool) -> Self {
        let (transcript, _) = watch::channel(String::new());
        Self {
            started: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
            deny,
            transcript,
        }
    }
}

#[async_trait]
impl VoiceCollaborator for MockVoice {
    async fn start_recording(&self) -> Result<(), VoiceError> {
        if self.deny {
            return Err(VoiceError::PermissionDenied);
        }
        self.started.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_recording(&self) -> Result<String, VoiceError> {
        if self.started.load(Ordering::SeqCst) == 0 {
            return Err(VoiceError::NotRecording);
        }
        Ok("final transcript".to_owned())
    }

    fn cancel_recording(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    fn transcript(&self) -> watch::Receiver<String> {
        self.transcript.subscribe()
    }
}

struct Harness {
    engine: TriageEngine,
    notices: mailsling_core::NoticeStream,
    backend: std::sync::Arc<MockBackend>,
    voice: std::sync::Arc<MockVoice>,
}

fn harness(backend: MockBackend, voice: MockVoice, ids: &[&str]) -> Harness {
    let backend = std::sync::Arc::new(backend);
    let voice = std::sync::Arc::new(voice);
    let (engine, notices) = TriageEngine::builder(backend.clone(), voice.clone())
        .config(geometry())
        .rows(rows(ids))
        .build()
        .unwrap();
    Harness {
        engine,
        notices,
        backend,
        voice,
    }
}

fn id(raw: &str) -> EmailId {
    EmailId::new(raw)
}

#[tokio::test]
async fn test_single_fire_and_no_cascade_after_origin_snap() {
    let mut h = harness(MockBackend::default(), MockVoice::new(false), &["a", "b"]);

    h.engine.touch_down(0.0);
    h.engine.touch_move(-130.0);
    assert_eq!(h.engine.step().await.unwrap(), Some(DispatchOutcome::Triaged));

    // The dispatch re-based the origin onto the finger, so the ball is
    // home and the guard cools down, then re-arms without firing.
    assert_eq!(h.engine.current_frame().ball_x, 0.0);
    assert_eq!(h.engine.step().await.unwrap(), None);

    // Holding at the same finger position, or jittering around it,
    // fires nothing: the excursion that fired is spent.
    for x in [-130.0, -125.0, -130.0, -135.0, -130.0] {
        h.engine.touch_move(x);
        assert_eq!(h.engine.step().await.unwrap(), None);
    }

    assert_eq!(h.backend.triage_calls(), 1);
    let session = h.engine.session();
    assert_eq!(session.triaged_kind(&id("a")), Some(ActionKind::Done));
    assert_eq!(session.triaged_kind(&id("b")), None);
}

#[tokio::test]
async fn test_fresh_excursion_triages_the_next_row_in_the_same_drag() {
    let mut h = harness(MockBackend::default(), MockVoice::new(false), &["a", "b"]);

    h.engine.touch_down(0.0);
    h.engine.touch_move(-130.0);
    assert_eq!(h.engine.step().await.unwrap(), Some(DispatchOutcome::Triaged));
    assert_eq!(h.engine.step().await.unwrap(), None); // re-arm at center

    // A second excursion of the same depth, measured from the new
    // origin, triages the next row without lifting the finger.
    h.engine.touch_move(-260.0);
    assert_eq!(h.engine.step().await.unwrap(), Some(DispatchOutcome::Triaged));

    let session = h.engine.session();
    assert_eq!(session.triaged_kind(&id("a")), Some(ActionKind::Done));
    assert_eq!(session.triaged_kind(&id("b")), Some(ActionKind::Done));
    assert_eq!(h.engine.row_index().active_index(), 2);
}

#[tokio::test]
async fn test_two_drags_two_targets_two_rows() {
    let mut h = harness(MockBackend::default(), MockVoice::new(false), &["a", "b"]);

    h.engine.touch_down(0.0);
    h.engine.touch_move(130.0);
    assert_eq!(h.engine.step().await.unwrap(), Some(DispatchOutcome::Triaged));
    h.engine.touch_up();

    h.engine.touch_down(0.0);
    h.engine.touch_move(-130.0);
    assert_eq!(h.engine.step().await.unwrap(), Some(DispatchOutcome::Triaged));
    h.engine.touch_up();

    let session = h.engine.session();
    assert_eq!(session.triaged_kind(&id("a")), Some(ActionKind::ReplyNeeded));
    assert_eq!(session.triaged_kind(&id("b")), Some(ActionKind::Done));
    assert_eq!(
        h.backend.calls(),
        vec!["triage a reply_needed", "triage b done"]
    );
}

#[tokio::test]
async fn test_duplicate_activation_before_resolution_mutates_once() {
    let h = harness(MockBackend::gated(), MockVoice::new(false), &["a"]);
    let event = ActivationEvent {
        row: 0,
        target: DONE,
        kind: TargetKind::Done,
    };
    let dispatcher = h.engine.dispatcher();

    let (first, second) = tokio::join!(dispatcher.on_activation(&event), async {
        // Let the first dispatch reach the backend, fire the duplicate,
        // then release the held mutation.
        tokio::task::yield_now().await;
        let outcome = dispatcher.on_activation(&event).await;
        h.backend.release();
        outcome
    });

    assert_eq!(first.unwrap(), DispatchOutcome::Triaged);
    assert_eq!(second.unwrap(), DispatchOutcome::AlreadyPending);
    assert_eq!(h.backend.triage_calls(), 1);
}

#[tokio::test]
async fn test_rejected_mutation_rolls_back_and_notifies() {
    let mut h = harness(MockBackend::rejecting(&["c"]), MockVoice::new(false), &["c"]);

    h.engine.touch_down(0.0);
    h.engine.touch_move(-130.0);
    assert_eq!(
        h.engine.step().await.unwrap(),
        Some(DispatchOutcome::RolledBack)
    );

    // Present right after the optimistic update, absent after rejection.
    let session = h.engine.session();
    let snapshot = session.snapshot();
    assert!(snapshot.triaged.is_empty());
    assert!(snapshot.in_flight.is_empty());
    assert_eq!(snapshot.undo_depth, 0);

    match h.notices.next().await.unwrap() {
        TriageNotice::MutationFailed { email_id, .. } => assert_eq!(email_id, id("c")),
        other => panic!("unexpected notice {other:?}"),
    }
}

#[tokio::test]
async fn test_auth_failure_rolls_back_and_raises_the_boundary() {
    let backend = MockBackend {
        auth_expired: true,
        ..MockBackend::default()
    };
    let mut h = harness(backend, MockVoice::new(false), &["a"]);

    h.engine.touch_down(0.0);
    h.engine.touch_move(-130.0);
    assert_eq!(
        h.engine.step().await.unwrap(),
        Some(DispatchOutcome::AuthRequired)
    );
    assert!(h.engine.session().snapshot().triaged.is_empty());

    assert!(matches!(
        h.notices.next().await.unwrap(),
        TriageNotice::MutationFailed { .. }
    ));
    assert_eq!(h.notices.next().await.unwrap(), TriageNotice::AuthRequired);
}

#[tokio::test]
async fn test_mic_starts_recording_without_advancing() {
    let mut h = harness(MockBackend::default(), MockVoice::new(false), &["a", "b"]);

    h.engine.touch_down(0.0);
    h.engine.touch_move(-400.0);
    assert_eq!(
        h.engine.step().await.unwrap(),
        Some(DispatchOutcome::MicStarted)
    );

    assert_eq!(h.voice.started.load(Ordering::SeqCst), 1);
    assert_eq!(h.engine.row_index().active_index(), 0);
    assert!(h.engine.session().snapshot().triaged.is_empty());
    assert!(h.backend.calls().is_empty());

    // Backing out must always work and must not triage the row.
    h.engine.dispatcher().cancel_mic();
    assert!(h.voice.cancelled.load(Ordering::SeqCst));
    assert!(h.engine.session().snapshot().triaged.is_empty());
}

#[tokio::test]
async fn test_mic_permission_denial_propagates_to_the_caller() {
    let mut h = harness(MockBackend::default(), MockVoice::new(true), &["a"]);

    h.engine.touch_down(0.0);
    h.engine.touch_move(-400.0);
    let event = h.engine.process().unwrap();
    assert!(matches!(
        h.engine.dispatch(&event).await,
        Err(Error::Voice(VoiceError::PermissionDenied))
    ));

    // The guard still resets normally: lifting and dragging again works.
    h.engine.touch_up();
    h.engine.touch_down(0.0);
    h.engine.touch_move(-130.0);
    assert_eq!(h.engine.step().await.unwrap(), Some(DispatchOutcome::Triaged));
}

#[tokio::test]
async fn test_finish_mic_returns_the_transcript() {
    let mut h = harness(MockBackend::default(), MockVoice::new(false), &["a"]);

    // Nothing to stop before a recording starts.
    assert!(matches!(
        h.engine.dispatcher().finish_mic().await,
        Err(Error::Voice(VoiceError::NotRecording))
    ));

    h.engine.touch_down(0.0);
    h.engine.touch_move(-400.0);
    assert_eq!(
        h.engine.step().await.unwrap(),
        Some(DispatchOutcome::MicStarted)
    );

    let transcript = h.engine.dispatcher().finish_mic().await.unwrap();
    assert_eq!(transcript, "final transcript");

    // Finishing the recording does not by itself triage the row.
    assert!(h.engine.session().snapshot().triaged.is_empty());
    assert_eq!(h.engine.row_index().active_index(), 0);
}

#[tokio::test]
async fn test_calendar_side_channel_reports_the_created_event() {
    let mut h = harness(MockBackend::default(), MockVoice::new(false), &["a"]);

    h.engine.dispatcher().add_to_calendar(id("a"), event_fields());

    assert_eq!(
        h.notices.next().await.unwrap(),
        TriageNotice::CalendarEventAdded {
            email_id: id("a"),
            url: "https://calendar.example/e/1".to_owned(),
        }
    );
    // Calendar creation is a side channel; the row stays untriaged.
    assert!(h.engine.session().snapshot().triaged.is_empty());
    assert_eq!(h.backend.calls(), vec!["calendar a"]);
}

#[tokio::test]
async fn test_calendar_failure_leaves_the_primary_triage_standing() {
    let backend = MockBackend {
        calendar_fails: true,
        ..MockBackend::default()
    };
    let mut h = harness(backend, MockVoice::new(false), &["a"]);

    h.engine.touch_down(0.0);
    h.engine.touch_move(-130.0);
    assert_eq!(h.engine.step().await.unwrap(), Some(DispatchOutcome::Triaged));

    h.engine.dispatcher().add_to_calendar(id("a"), event_fields());
    match h.notices.next().await.unwrap() {
        TriageNotice::SideChannelFailed { email_id, .. } => assert_eq!(email_id, id("a")),
        other => panic!("unexpected notice {other:?}"),
    }
    assert_eq!(
        h.engine.session().triaged_kind(&id("a")),
        Some(ActionKind::Done)
    );
}

#[tokio::test]
async fn test_unsubscribe_fires_the_side_channel_in_parallel() {
    let backend = MockBackend {
        manual_unsubscribe: true,
        ..MockBackend::default()
    };
    let mut h = harness(backend, MockVoice::new(false), &["a"]);

    h.engine.touch_down(0.0);
    h.engine.touch_move(400.0);
    assert_eq!(h.engine.step().await.unwrap(), Some(DispatchOutcome::Triaged));
    assert_eq!(
        h.engine.session().triaged_kind(&id("a")),
        Some(ActionKind::Unsubscribe)
    );

    // The side channel reports manual follow-up without touching the
    // primary triage.
    assert_eq!(
        h.notices.next().await.unwrap(),
        TriageNotice::UnsubscribeManualRequired { email_id: id("a") }
    );
    assert_eq!(
        h.engine.session().triaged_kind(&id("a")),
        Some(ActionKind::Unsubscribe)
    );
    assert!(h.backend.calls().contains(&"unsubscribe a".to_owned()));
}

#[tokio::test]
async fn test_activation_past_the_end_of_the_list_is_a_noop() {
    let h = harness(MockBackend::default(), MockVoice::new(false), &["a"]);
    let event = ActivationEvent {
        row: 99,
        target: DONE,
        kind: TargetKind::Done,
    };
    assert_eq!(
        h.engine.dispatcher().on_activation(&event).await.unwrap(),
        DispatchOutcome::OutOfRange
    );
    assert!(h.backend.calls().is_empty());
}

#[tokio::test]
async fn test_category_batch_and_undo_round_trip() {
    let h = harness(
        MockBackend::default(),
        MockVoice::new(false),
        &["a", "b", "c", "d", "e"],
    );
    let session = h.engine.session();
    session.toggle_punt(&id("b"));
    session.toggle_punt(&id("d"));

    let report = session.mark_category_done("inbox").await.unwrap();
    assert_eq!(report.succeeded.len(), 5);
    assert_eq!(h.backend.calls(), vec!["batch_triage 5"]);
    assert_eq!(session.triaged_kind(&id("b")), Some(ActionKind::ReplyNeeded));
    assert_eq!(session.triaged_kind(&id("c")), Some(ActionKind::Done));
    assert!(session.snapshot().punted.is_empty());

    let restored = session.undo().await.unwrap().unwrap();
    assert_eq!(restored.len(), 5);
    let snapshot = session.snapshot();
    assert!(snapshot.triaged.is_empty());
    assert_eq!(
        snapshot.punted,
        [id("b"), id("d")].into_iter().collect::<HashSet<_>>()
    );
}

#[tokio::test]
async fn test_feed_driven_engine_consumes_published_frames() {
    let h = harness(MockBackend::default(), MockVoice::new(false), &["a"]);
    let mut engine = h.engine;
    let session = engine.session();
    let tracker = engine.tracker();
    let (mut publisher, updates) = pointer_feed(&tracker);

    let driver = tokio::spawn(async move {
        engine.run(updates).await;
    });

    tracker.record_touch_down(0.0);
    publisher.publish(&tracker);
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    tracker.record_touch_move(-130.0);
    publisher.publish(&tracker);
    for _ in 0..5 {
        tokio::task::yield_now().await;
    }

    drop(publisher);
    driver.await.unwrap();

    assert_eq!(session.triaged_kind(&id("a")), Some(ActionKind::Done));
    assert_eq!(h.backend.triage_calls(), 1);
}
