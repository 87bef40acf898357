//! # mailsling-core
//!
//! Decision-side logic for the `Mailsling` triage gesture.
//!
//! This crate provides:
//! - Domain models (emails, triage actions, dispositions)
//! - Shared row list and active-row tracking
//! - Collaborator ports (backend mutations, voice, haptics)
//! - **Triage Session Store** - optimistic claims, rollback, punts, undo
//! - **Action Dispatcher** - activation to settled mutation, with notices
//! - **Triage Engine** - the assembled pipeline over `mailsling-gesture`
//! - **Render Supervisor** - panic boundary around row rendering

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod dispatch;
pub mod engine;
mod error;
pub mod model;
pub mod rows;
pub mod service;
pub mod session;
pub mod supervisor;

pub use dispatch::{ActionDispatcher, DispatchOutcome, NoticeSeverity, NoticeStream, TriageNotice};
pub use engine::{TriageEngine, TriageEngineBuilder};
pub use error::{Error, Result};
pub use model::{ActionKind, EmailId, EmailRow, TriageAction, TriageDisposition};
pub use rows::{RowIndexTracker, RowListHandle};
pub use service::{
    BackendError, BatchItem, BatchOutcome, CalendarEventFields, CalendarEventLink, Collaborators,
    FeedbackKind, FeedbackSink, NoopFeedback, TriageBackend, UnsubscribeOutcome, VoiceCollaborator,
    VoiceError,
};
pub use session::{
    BatchReport, SessionSnapshot, TriageSessionStore, UndoEntry, UndoPreview, UndoRecord,
};
pub use supervisor::{RenderOutcome, RenderSupervisor};
