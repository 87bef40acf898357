//! Activation dispatch and user-facing notices.

mod dispatcher;
mod notice;

pub use dispatcher::{ActionDispatcher, DispatchOutcome};
pub use notice::{NoticeSeverity, NoticeStream, TriageNotice};
