#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! HTTP client for the incident map backend REST API.
//!
//! Wraps the three backend endpoints (incident listing, report
//! submission, email subscription) behind the [`IncidentApi`] trait so
//! the reconciliation engine can be tested against canned responses.
//!
//! No call is ever retried automatically; a failed request surfaces once
//! and the user re-triggers the action.

use async_trait::async_trait;
use incident_map_client_models::{
    ApiIncident, ApiStatus, ReportRequest, StatusResponse, SubscribeRequest,
};
use thiserror::Error;

/// Header carrying the CSRF token on mutating requests.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Errors from backend API operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connection, timeout, body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success HTTP status.
    #[error("backend returned HTTP {status}")]
    Status {
        /// The HTTP status code received.
        status: reqwest::StatusCode,
    },

    /// The backend answered 2xx but rejected the mutation in the body.
    #[error("{message}")]
    Rejected {
        /// The backend's failure message, verbatim.
        message: String,
    },
}

/// The backend operations the reconciliation engine depends on.
#[async_trait]
pub trait IncidentApi: Send + Sync {
    /// Fetches the full incident list (`GET /api/incidents/`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the request fails or the backend answers
    /// with a non-success status.
    async fn fetch_incidents(&self) -> Result<Vec<ApiIncident>, ClientError>;

    /// Submits a new incident report (`POST /report/`).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Rejected`] with the backend's message when
    /// the body carries `status: "error"`, and other [`ClientError`]
    /// variants for transport or HTTP-status failures.
    async fn submit_report(&self, request: &ReportRequest) -> Result<StatusResponse, ClientError>;

    /// Registers an email subscription (`POST /subscribe/`).
    ///
    /// # Errors
    ///
    /// Same contract as [`IncidentApi::submit_report`].
    async fn subscribe(&self, request: &SubscribeRequest) -> Result<StatusResponse, ClientError>;
}

/// Concrete [`IncidentApi`] implementation over `reqwest`.
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    csrf_token: Option<String>,
}

impl BackendClient {
    /// Creates a client for the backend at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client,
            base_url,
            csrf_token: None,
        }
    }

    /// Attaches a CSRF token to be sent on every mutating request.
    #[must_use]
    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.post(self.endpoint(path));
        if let Some(token) = &self.csrf_token {
            builder = builder.header(CSRF_HEADER, token);
        }
        builder
    }
}

#[async_trait]
impl IncidentApi for BackendClient {
    async fn fetch_incidents(&self) -> Result<Vec<ApiIncident>, ClientError> {
        let resp = self
            .client
            .get(self.endpoint("/api/incidents/"))
            .send()
            .await?;
        require_success(resp.status())?;
        let incidents = resp.json::<Vec<ApiIncident>>().await?;
        log::debug!("Fetched {} incidents", incidents.len());
        Ok(incidents)
    }

    async fn submit_report(
        &self,
        request: &ReportRequest,
    ) -> Result<StatusResponse, ClientError> {
        let resp = self.post("/report/").json(request).send().await?;
        require_success(resp.status())?;
        let ack = resp.json::<StatusResponse>().await?;
        accept(ack)
    }

    async fn subscribe(
        &self,
        request: &SubscribeRequest,
    ) -> Result<StatusResponse, ClientError> {
        let resp = self.post("/subscribe/").json(request).send().await?;
        require_success(resp.status())?;
        let ack = resp.json::<StatusResponse>().await?;
        accept(ack)
    }
}

/// Maps a non-success HTTP status to [`ClientError::Status`].
fn require_success(status: reqwest::StatusCode) -> Result<(), ClientError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(ClientError::Status { status })
    }
}

/// Turns a 2xx acknowledgment carrying `status: "error"` into
/// [`ClientError::Rejected`], passing the backend's message through
/// verbatim.
fn accept(ack: StatusResponse) -> Result<StatusResponse, ClientError> {
    match ack.status {
        ApiStatus::Success => Ok(ack),
        ApiStatus::Error => Err(ClientError::Rejected {
            message: ack
                .message
                .unwrap_or_else(|| "request rejected by backend".to_string()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_without_double_slash() {
        let client = BackendClient::new(reqwest::Client::new(), "http://localhost:8000/");
        assert_eq!(
            client.endpoint("/api/incidents/"),
            "http://localhost:8000/api/incidents/"
        );
    }

    #[test]
    fn accept_passes_success_through() {
        let ack: StatusResponse =
            serde_json::from_str(r#"{"status": "success", "id": 3}"#).unwrap();
        let ack = accept(ack).unwrap();
        assert_eq!(ack.id, Some(3));
    }

    #[test]
    fn accept_surfaces_backend_message_verbatim() {
        let ack: StatusResponse =
            serde_json::from_str(r#"{"status": "error", "message": "datetime is required"}"#)
                .unwrap();
        match accept(ack) {
            Err(ClientError::Rejected { message }) => {
                assert_eq!(message, "datetime is required");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn accept_falls_back_when_message_missing() {
        let ack: StatusResponse = serde_json::from_str(r#"{"status": "error"}"#).unwrap();
        match accept(ack) {
            Err(ClientError::Rejected { message }) => {
                assert!(!message.is_empty());
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }
}
