//! User-facing notices from the dispatch path.
//!
//! Optimistic updates succeed silently; only outcomes the user must hear
//! about cross this channel. The stream is unbounded because notices are
//! rare and small, and dropping one is worse than buffering it.

use tokio::sync::mpsc;

use crate::model::EmailId;

/// Something the triage flow wants the user to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriageNotice {
    /// A triage or untriage mutation failed and the optimistic update was
    /// rolled back; the row is back where it was.
    MutationFailed {
        /// Email whose mutation failed.
        email_id: EmailId,
        /// Human-readable reason.
        message: String,
    },

    /// A side-channel call failed. The primary triage stands; only the
    /// extra behavior was lost.
    SideChannelFailed {
        /// Email whose side channel failed.
        email_id: EmailId,
        /// Human-readable reason.
        message: String,
    },

    /// The sender offers no automatic unsubscribe; the user has to finish
    /// in a browser.
    UnsubscribeManualRequired {
        /// Email whose sender needs manual unsubscribing.
        email_id: EmailId,
    },

    /// A calendar event was created from an email.
    CalendarEventAdded {
        /// Source email.
        email_id: EmailId,
        /// Link opening the event.
        url: String,
    },

    /// The mic target could not start recording.
    MicUnavailable {
        /// Human-readable reason.
        message: String,
    },

    /// The session is no longer authenticated; the app's auth boundary
    /// takes over from here.
    AuthRequired,
}

/// How loudly a notice should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeSeverity {
    /// Passive confirmation.
    Info,
    /// Something degraded but the action stands.
    Warning,
    /// The action did not happen.
    Error,
}

impl TriageNotice {
    /// Presentation severity of this notice.
    #[must_use]
    pub const fn severity(&self) -> NoticeSeverity {
        match self {
            Self::CalendarEventAdded { .. } => NoticeSeverity::Info,
            Self::SideChannelFailed { .. }
            | Self::UnsubscribeManualRequired { .. }
            | Self::MicUnavailable { .. } => NoticeSeverity::Warning,
            Self::MutationFailed { .. } | Self::AuthRequired => NoticeSeverity::Error,
        }
    }
}

/// Receiving half of the notice channel.
#[derive(Debug)]
pub struct NoticeStream {
    rx: mpsc::UnboundedReceiver<TriageNotice>,
}

impl NoticeStream {
    /// Waits for the next notice. Returns `None` once every sender is
    /// gone and the buffer is drained.
    pub async fn next(&mut self) -> Option<TriageNotice> {
        self.rx.recv().await
    }

    /// Takes a buffered notice without waiting.
    pub fn try_next(&mut self) -> Option<TriageNotice> {
        self.rx.try_recv().ok()
    }
}

pub(crate) fn notice_channel() -> (mpsc::UnboundedSender<TriageNotice>, NoticeStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (tx, NoticeStream { rx })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ranking() {
        assert_eq!(
            TriageNotice::AuthRequired.severity(),
            NoticeSeverity::Error
        );
        assert!(
            TriageNotice::CalendarEventAdded {
                email_id: EmailId::new("a"),
                url: String::new(),
            }
            .severity()
                < TriageNotice::MutationFailed {
                    email_id: EmailId::new("a"),
                    message: String::new(),
                }
                .severity()
        );
    }

    #[tokio::test]
    async fn test_stream_drains_then_closes() {
        let (tx, mut stream) = notice_channel();
        tx.send(TriageNotice::AuthRequired).unwrap();
        drop(tx);

        assert_eq!(stream.next().await, Some(TriageNotice::AuthRequired));
        assert_eq!(stream.next().await, None);
    }
}
