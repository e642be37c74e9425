#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geocoding for the incident map.
//!
//! Converts free-text addresses to latitude/longitude candidates (forward
//! search, used for address suggestions and report resolution) and
//! coordinates back to place descriptions (reverse lookup, used to pre-fill
//! the country classification after a map click).
//!
//! The single provider is Nominatim / `OpenStreetMap`, configured via
//! `services/nominatim.toml` embedded at compile time. Callers never retry:
//! a failed lookup is reported once and the user decides whether to try
//! again.

pub mod nominatim;

use async_trait::async_trait;
use thiserror::Error;

pub use nominatim::{NominatimClient, NominatimConfig};

/// A geocoding candidate with coordinates and descriptive metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodedPlace {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
    /// The display name returned by the geocoder.
    pub display_name: Option<String>,
    /// Country name, when the response carries one (reverse lookups).
    pub country: Option<String>,
}

/// Errors from geocoding operations.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsing failed.
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parsing failure.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimited,
}

/// A forward/reverse geocoding provider.
///
/// The reconciliation engine depends on this trait rather than a concrete
/// client, so tests can substitute canned candidates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Searches for places matching a free-text query, best match first.
    ///
    /// Returns an empty vector when nothing matched; that is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP request or response parsing
    /// fails.
    async fn search(&self, query: &str) -> Result<Vec<GeocodedPlace>, GeocodeError>;

    /// Looks up the place containing a coordinate.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the HTTP request or response parsing
    /// fails.
    async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<GeocodedPlace>, GeocodeError>;
}
