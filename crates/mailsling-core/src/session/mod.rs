//! Session-scoped triage state: the punt set, in-flight claims, recorded
//! triages, and the undo stack.

mod store;
mod undo;

pub use store::{BatchReport, SessionSnapshot, TriageSessionStore, UndoPreview};
pub use undo::{UndoEntry, UndoRecord};
