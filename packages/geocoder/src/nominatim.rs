//! Nominatim / OpenStreetMap geocoder client.
//!
//! Nominatim has strict rate limits: **1 request per second** maximum on
//! the public instance (`rate_limit_ms` in the service TOML). Both lookups
//! here are single requests initiated by a user action, so the limit is
//! respected as long as the UI debounces its suggestion queries.
//!
//! See <https://nominatim.org/release-docs/develop/api/Search/>

use serde::Deserialize;

use crate::{GeocodeError, GeocodedPlace, Geocoder};

/// Nominatim service parameters loaded from `services/nominatim.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimConfig {
    /// Unique identifier (`"nominatim"`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Forward search endpoint URL.
    pub search_url: String,
    /// Reverse lookup endpoint URL.
    pub reverse_url: String,
    /// Maximum number of candidates per forward search.
    pub max_results: u8,
    /// Minimum delay between requests in milliseconds.
    pub rate_limit_ms: u64,
}

const SERVICE_TOML: &str = include_str!("../services/nominatim.toml");

impl NominatimConfig {
    /// Returns the embedded service configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded TOML is malformed (a compile-time guarantee,
    /// since the config ships inside the crate).
    #[must_use]
    pub fn embedded() -> Self {
        toml::from_str(SERVICE_TOML).expect("embedded nominatim.toml is malformed")
    }
}

/// Nominatim client implementing [`Geocoder`].
pub struct NominatimClient {
    client: reqwest::Client,
    config: NominatimConfig,
}

impl NominatimClient {
    /// Creates a client with the embedded service configuration.
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_config(client, NominatimConfig::embedded())
    }

    /// Creates a client with an explicit configuration (tests, self-hosted
    /// instances).
    #[must_use]
    pub const fn with_config(client: reqwest::Client, config: NominatimConfig) -> Self {
        Self { client, config }
    }

    /// Returns the active service configuration.
    #[must_use]
    pub const fn config(&self) -> &NominatimConfig {
        &self.config
    }
}

#[async_trait::async_trait]
impl Geocoder for NominatimClient {
    async fn search(&self, query: &str) -> Result<Vec<GeocodedPlace>, GeocodeError> {
        log::debug!("Nominatim forward search: {query}");
        let limit = self.config.max_results.to_string();
        let resp = self
            .client
            .get(&self.config.search_url)
            .query(&[("q", query), ("format", "jsonv2"), ("limit", &limit)])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.json().await?;
        parse_search_response(&body)
    }

    async fn reverse(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Option<GeocodedPlace>, GeocodeError> {
        log::debug!("Nominatim reverse lookup: {latitude},{longitude}");
        let lat = latitude.to_string();
        let lon = longitude.to_string();
        let resp = self
            .client
            .get(&self.config.reverse_url)
            .query(&[("lat", lat.as_str()), ("lon", lon.as_str()), ("format", "jsonv2")])
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(GeocodeError::RateLimited);
        }

        let body: serde_json::Value = resp.json().await?;
        parse_reverse_response(&body)
    }
}

/// Parses a Nominatim forward search response.
fn parse_search_response(body: &serde_json::Value) -> Result<Vec<GeocodedPlace>, GeocodeError> {
    let results = body.as_array().ok_or_else(|| GeocodeError::Parse {
        message: "Nominatim search response is not an array".to_string(),
    })?;

    results.iter().map(parse_place).collect()
}

/// Parses a Nominatim reverse lookup response.
///
/// An unmatched coordinate comes back as `{"error": "Unable to geocode"}`,
/// which maps to `Ok(None)` rather than a parse failure.
fn parse_reverse_response(
    body: &serde_json::Value,
) -> Result<Option<GeocodedPlace>, GeocodeError> {
    if body.get("error").is_some() {
        return Ok(None);
    }
    parse_place(body).map(Some)
}

/// Parses one Nominatim place object into a [`GeocodedPlace`].
fn parse_place(value: &serde_json::Value) -> Result<GeocodedPlace, GeocodeError> {
    let lat = value["lat"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lat in Nominatim response".to_string(),
        })?;

    let lon = value["lon"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| GeocodeError::Parse {
            message: "Missing lon in Nominatim response".to_string(),
        })?;

    let display_name = value["display_name"].as_str().map(String::from);
    let country = value["address"]["country"].as_str().map(String::from);

    Ok(GeocodedPlace {
        latitude: lat,
        longitude: lon,
        display_name,
        country,
    })
}
