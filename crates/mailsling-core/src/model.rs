//! Domain models for triage.

use mailsling_gesture::TargetKind;
use serde::{Deserialize, Serialize};

/// Opaque identifier of an email, as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailId(String);

impl EmailId {
    /// Creates an id from its backend representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Backend representation of this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EmailId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// One email as presented in the triage list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailRow {
    /// Backend identifier.
    pub id: EmailId,
    /// Subject line.
    pub subject: String,
    /// Display name or address of the sender.
    pub sender: String,
    /// Category bucket the row is grouped under.
    pub category: String,
}

/// The triage action a fired target maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Archive the email as handled.
    Done,
    /// File the email for a later reply.
    ReplyNeeded,
    /// Start a voice reply. Does not advance the list or touch the
    /// session; the recording flow owns what happens next.
    MicStart,
    /// Archive the email and unsubscribe from the sender.
    Unsubscribe,
}

impl ActionKind {
    /// Stable lowercase name, matching the wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::ReplyNeeded => "reply_needed",
            Self::MicStart => "mic_start",
            Self::Unsubscribe => "unsubscribe",
        }
    }

    /// Whether dispatching this action advances to the next row.
    #[must_use]
    pub const fn is_advancing(self) -> bool {
        !matches!(self, Self::MicStart)
    }

    /// The terminal disposition this action asks the backend to record,
    /// if it records one at all.
    #[must_use]
    pub const fn disposition(self) -> Option<TriageDisposition> {
        match self {
            Self::Done | Self::Unsubscribe => Some(TriageDisposition::Done),
            Self::ReplyNeeded => Some(TriageDisposition::ReplyNeeded),
            Self::MicStart => None,
        }
    }
}

impl From<TargetKind> for ActionKind {
    fn from(kind: TargetKind) -> Self {
        match kind {
            TargetKind::Done => Self::Done,
            TargetKind::Reply => Self::ReplyNeeded,
            TargetKind::Mic => Self::MicStart,
            TargetKind::Unsubscribe => Self::Unsubscribe,
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal state a triage mutation records for an email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriageDisposition {
    /// Handled; leaves the inbox.
    Done,
    /// Parked in the reply-needed pile.
    ReplyNeeded,
}

impl TriageDisposition {
    /// Stable lowercase name, matching the wire spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Done => "done",
            Self::ReplyNeeded => "reply_needed",
        }
    }
}

impl std::fmt::Display for TriageDisposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One triage action bound to a concrete email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriageAction {
    /// Email the action applies to.
    pub email_id: EmailId,
    /// What to do with it.
    pub kind: ActionKind,
    /// Index the row occupied when the action was decided. Kept for undo
    /// presentation and diagnostics; never used to re-resolve the row.
    pub origin_index: usize,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_wire_names() {
        assert_eq!(
            serde_json::to_string(&ActionKind::ReplyNeeded).unwrap(),
            "\"reply_needed\""
        );
        assert_eq!(ActionKind::MicStart.as_str(), "mic_start");
    }

    #[test]
    fn test_only_mic_is_non_advancing() {
        assert!(ActionKind::Done.is_advancing());
        assert!(ActionKind::ReplyNeeded.is_advancing());
        assert!(ActionKind::Unsubscribe.is_advancing());
        assert!(!ActionKind::MicStart.is_advancing());
    }

    #[test]
    fn test_dispositions() {
        assert_eq!(
            ActionKind::Unsubscribe.disposition(),
            Some(TriageDisposition::Done)
        );
        assert_eq!(
            ActionKind::ReplyNeeded.disposition(),
            Some(TriageDisposition::ReplyNeeded)
        );
        assert_eq!(ActionKind::MicStart.disposition(), None);
    }

    #[test]
    fn test_target_kind_mapping() {
        assert_eq!(ActionKind::from(TargetKind::Done), ActionKind::Done);
        assert_eq!(ActionKind::from(TargetKind::Reply), ActionKind::ReplyNeeded);
        assert_eq!(ActionKind::from(TargetKind::Mic), ActionKind::MicStart);
        assert_eq!(
            ActionKind::from(TargetKind::Unsubscribe),
            ActionKind::Unsubscribe
        );
    }
}
