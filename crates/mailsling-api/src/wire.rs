//! Request and response bodies, as the backend speaks them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mailsling_core::{BatchItem, CalendarEventFields, TriageDisposition};

#[derive(Debug, Serialize)]
pub(crate) struct TriageRequest {
    pub action: TriageDisposition,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchTriageRequest {
    pub actions: Vec<BatchTriageAction>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchTriageAction {
    pub email_id: String,
    pub action: TriageDisposition,
}

impl From<&BatchItem> for BatchTriageAction {
    fn from(item: &BatchItem) -> Self {
        Self {
            email_id: item.email_id.as_str().to_owned(),
            action: item.action,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchTriageResponse {
    pub triaged_count: usize,
    #[serde(default)]
    pub errors: Vec<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchUntriageRequest {
    pub email_ids: Vec<String>,
}

/// The backend answers an unsubscribe with exactly one of the two flags.
#[derive(Debug, Deserialize)]
pub(crate) struct UnsubscribeResponse {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub manual_required: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct CalendarEventRequest {
    pub title: String,
    pub starts_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl From<&CalendarEventFields> for CalendarEventRequest {
    fn from(fields: &CalendarEventFields) -> Self {
        Self {
            title: fields.title.clone(),
            starts_at: fields.starts_at,
            ends_at: fields.ends_at,
            location: fields.location.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CalendarEventResponse {
    pub calendar_link: String,
}
