//! Report draft validation and submission errors.
//!
//! The submission flow itself lives on [`crate::MapSession`]; this module
//! holds the draft shape, the Validating-phase checks (which must run
//! before any network call), and the error taxonomy surfaced to the user.

use incident_map_client_models::ReportRequest;
use incident_map_incident_models::{Coordinate, Country, validate_image_data_url};
use thiserror::Error;

/// A report as composed in the form, before resolution and submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportDraft {
    /// When the incident occurred. Required.
    pub date_time: String,
    /// Latitude, when picked on the map or typed in.
    pub latitude: Option<f64>,
    /// Longitude, when picked on the map or typed in.
    pub longitude: Option<f64>,
    /// What happened. Required.
    pub description: String,
    /// Optional source URL.
    pub source: Option<String>,
    /// Optional free-text address.
    pub address: Option<String>,
    /// Optional country classification.
    pub country: Option<Country>,
    /// Optional photo evidence as a base64 data URL.
    pub image: Option<String>,
}

impl ReportDraft {
    /// The draft's coordinate pair, when both halves are present and in
    /// range.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng).ok(),
            _ => None,
        }
    }

    /// The draft's address, when non-blank.
    #[must_use]
    pub fn trimmed_address(&self) -> Option<&str> {
        self.address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
    }
}

/// Errors from the report submission flow.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The draft failed local validation; no network call was made.
    #[error("validation failed: {message}")]
    Validation {
        /// What is missing or malformed.
        message: String,
    },

    /// Another submission is still in flight.
    #[error("a submission is already in progress")]
    InFlight,

    /// The backend rejected the report; the message is the backend's,
    /// verbatim.
    #[error("{message}")]
    Rejected {
        /// The backend's failure message.
        message: String,
    },

    /// The request could not be completed.
    #[error("network error, please try again")]
    Network(#[source] incident_map_client::ClientError),
}

/// The Validating phase: checks the draft without touching the network.
///
/// # Errors
///
/// Returns [`SubmitError::Validation`] when a required field is blank,
/// the coordinate pair is incomplete or out of range, no location of any
/// kind is present, or the image payload is rejected.
pub fn validate(draft: &ReportDraft) -> Result<(), SubmitError> {
    if draft.date_time.trim().is_empty() {
        return Err(validation("date/time is required"));
    }
    if draft.description.trim().is_empty() {
        return Err(validation("description is required"));
    }

    match (draft.latitude, draft.longitude) {
        (Some(lat), Some(lng)) => {
            Coordinate::new(lat, lng).map_err(|e| validation(&e.to_string()))?;
        }
        (Some(_), None) | (None, Some(_)) => {
            return Err(validation("both latitude and longitude are required"));
        }
        (None, None) => {}
    }

    let has_location =
        draft.coordinate().is_some() || draft.trimmed_address().is_some() || draft.country.is_some();
    if !has_location {
        return Err(validation(
            "a location is required: coordinates, an address, or a country",
        ));
    }

    if let Some(image) = &draft.image {
        validate_image_data_url(image).map_err(|e| validation(&e.to_string()))?;
    }

    Ok(())
}

fn validation(message: &str) -> SubmitError {
    SubmitError::Validation {
        message: message.to_string(),
    }
}

/// Assembles the wire payload from a validated draft.
#[must_use]
pub fn to_request(draft: &ReportDraft) -> ReportRequest {
    ReportRequest {
        date_time: draft.date_time.trim().to_string(),
        latitude: draft.latitude,
        longitude: draft.longitude,
        description: draft.description.trim().to_string(),
        source: draft.source.clone().filter(|s| !s.trim().is_empty()),
        image: draft.image.clone(),
        address: draft.trimmed_address().map(String::from),
        country: draft.country.map(|c| c.to_string()),
    }
}
