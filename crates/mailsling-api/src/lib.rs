//! # mailsling-api
//!
//! JSON-over-HTTP implementation of the triage backend contract.
//!
//! [`ApiClient`] implements `mailsling_core::TriageBackend` against the
//! Mailsling backend: one endpoint per mutation, bearer-token auth, and a
//! fixed mapping from HTTP outcomes to `BackendError` so the dispatcher's
//! rollback logic stays transport-agnostic.
//!
//! ```ignore
//! use std::time::Duration;
//! use mailsling_api::{ApiClient, ApiConfig};
//!
//! let client = ApiClient::new(ApiConfig {
//!     base_url: "https://api.mailsling.app".to_owned(),
//!     bearer_token: token,
//!     timeout: Duration::from_secs(10),
//! })?;
//! let engine = TriageEngine::builder(Arc::new(client), voice);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod client;
mod error;
mod wire;

pub use client::{ApiClient, ApiConfig};
pub use error::{ApiError, Result};
