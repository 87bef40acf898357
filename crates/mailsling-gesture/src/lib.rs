//! # mailsling-gesture
//!
//! The input side of Mailsling's drag-to-triage interaction: passive
//! gesture capture, pure proximity evaluation, and the activation guard
//! state machine that turns one continuous drag into discrete,
//! exactly-once target activations.
//!
//! ## Features
//!
//! - **Passive capture**: the tracker observes the platform's capture-phase
//!   touch events without claiming the gesture, so list scrolling keeps
//!   working while a drag is live
//! - **Lock-free hot path**: the latest pointer sample lives in a single
//!   atomic slot; no queue, no allocation, no lock on the input thread
//! - **Pure geometry**: [`proximity::evaluate`] maps a sample to a ball
//!   position and per-target readings with no hidden state
//! - **Exactly-once activations**: [`ActivationGuard`] de-duplicates zone
//!   presence into single fire events, with a cooldown that survives the
//!   post-activation snap back to center
//! - **Coalescing feed**: a [`tokio::sync::watch`]-backed channel hands the
//!   decision task each published frame at most once and in order
//!
//! ## Quick Start
//!
//! ```ignore
//! use mailsling_gesture::{
//!     ActivationGuard, GestureTracker, TriageConfig, proximity,
//! };
//!
//! let config = TriageConfig::default();
//! config.validate()?;
//!
//! let tracker = GestureTracker::new(config.center);
//! let mut guard = ActivationGuard::new(&config);
//!
//! // Input side, capture phase:
//! tracker.record_touch_down(0.0);
//! guard.on_touch_down();
//! tracker.record_touch_move(-130.0);
//!
//! // Decision side, once per frame:
//! let origin = 0.0;
//! let frame = proximity::evaluate(&config, origin, tracker.current_x());
//! if let Some(event) = guard.evaluate(&frame, 0) {
//!     println!("fired {} for row {}", event.kind, event.row);
//! }
//! ```
//!
//! ## Guard Phases
//!
//! ```text
//! ┌──────┐ touch-down ┌──────────┐ zone entry ┌───────────┐
//! │ Idle │ ─────────→ │ Dragging │ ─────────→ │ Activated │
//! └──────┘            └──────────┘            └───────────┘
//!     ↑                    ↑                    │ same tick
//!     │ touch-up           │ ball near center   ▼
//!     │ (any phase)        │               ┌──────────┐
//!     └────────────────────┴────────────── │ Cooldown │
//!                                          └──────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`]: target geometry and interaction tuning
//! - [`tracker`]: lock-free pointer sample cell and drag origin
//! - [`proximity`]: pure sample-to-readings evaluation
//! - [`guard`]: the activation state machine
//! - [`feed`]: coalescing pointer frame channel

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod feed;
pub mod guard;
pub mod proximity;
pub mod tracker;

pub use config::{ConfigError, Target, TargetId, TargetKind, TriageConfig};
pub use feed::{PointerFrame, PointerPublisher, PointerUpdates, pointer_feed};
pub use guard::{ActivationEvent, ActivationGuard, ActivationPhase};
pub use proximity::{ProximityFrame, TargetProximity};
pub use tracker::{DragOrigin, GestureSample, GestureTracker};
