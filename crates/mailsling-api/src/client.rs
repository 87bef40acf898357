//! The HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use mailsling_core::{
    BackendError, BatchItem, BatchOutcome, CalendarEventFields, CalendarEventLink, EmailId,
    TriageBackend, TriageDisposition, UnsubscribeOutcome,
};

use crate::error::{ApiError, Result};
use crate::wire::{
    BatchTriageRequest, BatchTriageResponse, BatchUntriageRequest, CalendarEventRequest,
    CalendarEventResponse, TriageRequest, UnsubscribeResponse,
};

/// Connection settings for the Mailsling backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Scheme and host, without a trailing slash.
    pub base_url: String,
    /// Bearer token attached to every request.
    pub bearer_token: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// JSON-over-HTTP implementation of [`TriageBackend`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    bearer_token: String,
}

impl ApiClient {
    /// Builds a client from its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] for an empty base URL and
    /// [`ApiError::Http`] when the underlying client cannot be built.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            return Err(ApiError::Config("base URL is empty".to_owned()));
        }
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url,
            bearer_token: config.bearer_token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B: serde::Serialize + Sync>(&self, path: &str, body: &B) -> Result<Response> {
        debug!(path, "POST");
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.bearer_token)
            .json(body)
            .send()
            .await?;
        check(response).await
    }

    async fn post_empty(&self, path: &str) -> Result<Response> {
        debug!(path, "POST");
        let response = self
            .http
            .post(self.url(path))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        check(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + Sync,
        T: DeserializeOwned,
    {
        Ok(self.post(path, body).await?.json().await?)
    }

    async fn post_empty_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        Ok(self.post_empty(path).await?.json().await?)
    }
}

/// Trades a non-success response for an [`ApiError::Status`] carrying as
/// much of the body as could be read.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status { status, body })
}

#[async_trait]
impl TriageBackend for ApiClient {
    async fn triage(
        &self,
        email_id: &EmailId,
        action: TriageDisposition,
    ) -> std::result::Result<(), BackendError> {
        self.post(
            &format!("/v1/emails/{email_id}/triage"),
            &TriageRequest { action },
        )
        .await
        .map(drop)
        .map_err(ApiError::into_backend)
    }

    async fn batch_triage(
        &self,
        items: &[BatchItem],
    ) -> std::result::Result<BatchOutcome, BackendError> {
        let request = BatchTriageRequest {
            actions: items.iter().map(Into::into).collect(),
        };
        let response: BatchTriageResponse = self
            .post_json("/v1/triage/batch", &request)
            .await
            .map_err(ApiError::into_backend)?;
        Ok(BatchOutcome {
            triaged_count: response.triaged_count,
            errors: response.errors.into_iter().map(EmailId::new).collect(),
        })
    }

    async fn untriage(&self, email_id: &EmailId) -> std::result::Result<(), BackendError> {
        self.post_empty(&format!("/v1/emails/{email_id}/untriage"))
            .await
            .map(drop)
            .map_err(ApiError::into_backend)
    }

    async fn batch_untriage(&self, email_ids: &[EmailId]) -> std::result::Result<(), BackendError> {
        let request = BatchUntriageRequest {
            email_ids: email_ids.iter().map(|id| id.as_str().to_owned()).collect(),
        };
        self.post("/v1/triage/batch-untriage", &request)
            .await
            .map(drop)
            .map_err(ApiError::into_backend)
    }

    async fn unsubscribe(
        &self,
        email_id: &EmailId,
    ) -> std::result::Result<UnsubscribeOutcome, BackendError> {
        let response: UnsubscribeResponse = self
            .post_empty_json(&format!("/v1/emails/{email_id}/unsubscribe"))
            .await
            .map_err(ApiError::into_backend)?;
        if response.manual_required && !response.completed {
            Ok(UnsubscribeOutcome::ManualRequired)
        } else {
            Ok(UnsubscribeOutcome::Completed)
        }
    }

    async fn add_calendar_event(
        &self,
        email_id: &EmailId,
        event: &CalendarEventFields,
    ) -> std::result::Result<CalendarEventLink, BackendError> {
        let response: CalendarEventResponse = self
            .post_json(
                &format!("/v1/emails/{email_id}/calendar-event"),
                &CalendarEventRequest::from(event),
            )
            .await
            .map_err(ApiError::into_backend)?;
        Ok(CalendarEventLink {
            url: response.calendar_link,
        })
    }
}
