#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! REST API request and response types for the incident map backend.
//!
//! These types mirror the backend's JSON contract exactly and are kept
//! separate from the domain types in `incident_map_incident_models` so the
//! wire shapes can evolve independently of the store.

use incident_map_incident_models::{Country, Incident};
use serde::{Deserialize, Serialize};

/// An incident element as returned by `GET /api/incidents/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiIncident {
    /// Backend-assigned identifier.
    #[serde(default)]
    pub id: Option<i64>,
    /// Latitude in degrees, if the backend has one.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude in degrees, if the backend has one.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Timestamp string of when the incident occurred.
    pub datetime: String,
    /// Description of what happened.
    pub description: String,
    /// Source URL backing the report.
    #[serde(default)]
    pub source: Option<String>,
    /// URL of the uploaded photo evidence, if any.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Whether the backend has verified this report.
    #[serde(default)]
    pub verified: bool,
    /// Free-text location description.
    #[serde(default)]
    pub address: Option<String>,
    /// Country classification code.
    #[serde(default)]
    pub country: Option<String>,
}

impl From<ApiIncident> for Incident {
    fn from(api: ApiIncident) -> Self {
        // An unrecognized country string degrades to "unclassified" rather
        // than rejecting the whole record.
        let country = api.country.as_deref().and_then(|c| c.parse::<Country>().ok());
        Self {
            id: api.id,
            latitude: api.latitude,
            longitude: api.longitude,
            date_time: api.datetime,
            description: api.description,
            source: api.source,
            address: api.address,
            country,
            image: api.image_url,
            verified: api.verified,
        }
    }
}

/// Payload for `POST /report/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    /// Timestamp string of when the incident occurred.
    pub date_time: String,
    /// Latitude in degrees, if resolved client-side.
    pub latitude: Option<f64>,
    /// Longitude in degrees, if resolved client-side.
    pub longitude: Option<f64>,
    /// Description of what happened.
    pub description: String,
    /// Source URL backing the report.
    pub source: Option<String>,
    /// Inline photo evidence as a base64 data URL.
    pub image: Option<String>,
    /// Free-text location; the backend may geocode it server-side when no
    /// coordinates are present.
    pub address: Option<String>,
    /// Country classification code.
    pub country: Option<String>,
}

/// Payload for `POST /subscribe/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Subscriber name.
    pub name: String,
    /// Subscriber email address.
    pub email: String,
    /// Subscriber address for location-scoped alerts.
    pub address: String,
    /// Latitude of the subscriber's address, if known.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude of the subscriber's address, if known.
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Outcome tag in mutation responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    /// The mutation was applied.
    Success,
    /// The backend rejected the mutation; `message` explains why.
    Error,
}

/// Response body for `POST /report/` and `POST /subscribe/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Outcome tag.
    pub status: ApiStatus,
    /// Backend-supplied failure message when `status` is `error`.
    #[serde(default)]
    pub message: Option<String>,
    /// Backend-assigned ID of the created record, when reported.
    #[serde(default)]
    pub id: Option<i64>,
}
