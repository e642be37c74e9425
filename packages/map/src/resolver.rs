//! Coordinate resolution for user-supplied locations.
//!
//! Report locations arrive three ways: typed-in coordinates, a free-text
//! address, or a click on the map. The resolver turns any of them into a
//! definite [`Coordinate`], delegating to the geocoder when only an
//! address is given and reverse-geocoding clicks to pre-fill the country
//! classification.

use std::sync::Arc;

use incident_map_incident_models::{Coordinate, Country, InvalidCoordinateError};
use incident_map_geocoder::{GeocodeError, GeocodedPlace, Geocoder};
use thiserror::Error;

/// Decimal places shown for map-click coordinates.
const CLICK_DISPLAY_PRECISION: i32 = 6;

/// Queries shorter than this return no suggestions (matches the address
/// input's behavior of staying quiet until the user has typed something).
const MIN_SUGGESTION_QUERY_LEN: usize = 3;

/// One way of telling the system where an incident happened.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateInput {
    /// Coordinates typed into the form.
    Manual {
        /// Latitude in degrees.
        latitude: f64,
        /// Longitude in degrees.
        longitude: f64,
    },
    /// Free-text address to geocode.
    Address {
        /// The address text.
        address: String,
    },
    /// A click on the map surface.
    MapClick {
        /// Latitude of the click.
        latitude: f64,
        /// Longitude of the click.
        longitude: f64,
    },
}

/// A definite location produced by the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCoordinate {
    /// The resolved position.
    pub coordinate: Coordinate,
    /// Country classification, when a lookup provided one.
    pub country: Option<Country>,
    /// Canonical address text returned by the geocoder, when available.
    pub matched_address: Option<String>,
}

/// Errors from coordinate resolution.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Input was rejected locally; nothing was sent over the network.
    #[error("invalid coordinate: {0}")]
    Validation(#[from] InvalidCoordinateError),

    /// The geocoder returned zero candidates for the address.
    #[error("no match found for the given address")]
    NotFound,

    /// The geocoding call itself failed.
    #[error("geocoding failed: {0}")]
    Upstream(#[from] GeocodeError),
}

/// Resolves [`CoordinateInput`]s, consulting the geocoder as needed.
pub struct CoordinateResolver {
    geocoder: Arc<dyn Geocoder>,
}

impl CoordinateResolver {
    /// Creates a resolver over the given geocoder.
    #[must_use]
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self { geocoder }
    }

    /// Resolves an input to a definite coordinate.
    ///
    /// Manual coordinates are validated and returned unchanged. Addresses
    /// take the geocoder's first candidate; no retry is attempted, the
    /// caller decides whether to prompt again. Map clicks are rounded for
    /// display consistency and trigger a best-effort reverse lookup whose
    /// failure is logged, never propagated.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Validation`] for out-of-range manual input,
    /// [`ResolveError::NotFound`] when an address has no candidates, and
    /// [`ResolveError::Upstream`] when the geocoding call fails.
    pub async fn resolve(
        &self,
        input: CoordinateInput,
    ) -> Result<ResolvedCoordinate, ResolveError> {
        match input {
            CoordinateInput::Manual {
                latitude,
                longitude,
            } => Ok(ResolvedCoordinate {
                coordinate: Coordinate::new(latitude, longitude)?,
                country: None,
                matched_address: None,
            }),

            CoordinateInput::Address { address } => {
                let candidates = self.geocoder.search(&address).await?;
                let Some(first) = candidates.into_iter().next() else {
                    return Err(ResolveError::NotFound);
                };
                Ok(ResolvedCoordinate {
                    coordinate: Coordinate::new(first.latitude, first.longitude)?,
                    country: first.country.as_deref().map(classify_country),
                    matched_address: first.display_name,
                })
            }

            CoordinateInput::MapClick {
                latitude,
                longitude,
            } => {
                let coordinate =
                    Coordinate::new(latitude, longitude)?.rounded(CLICK_DISPLAY_PRECISION);
                let country = match self
                    .geocoder
                    .reverse(coordinate.latitude, coordinate.longitude)
                    .await
                {
                    Ok(place) => place.and_then(|p| p.country.as_deref().map(classify_country)),
                    Err(e) => {
                        log::debug!("Reverse geocode failed, leaving country unset: {e}");
                        None
                    }
                };
                Ok(ResolvedCoordinate {
                    coordinate,
                    country,
                    matched_address: None,
                })
            }
        }
    }

    /// Forward-search candidates for the address suggestion dropdown.
    ///
    /// Queries shorter than [`MIN_SUGGESTION_QUERY_LEN`] characters return
    /// an empty list without hitting the geocoder.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Upstream`] when the geocoding call fails.
    pub async fn suggestions(&self, query: &str) -> Result<Vec<GeocodedPlace>, ResolveError> {
        let query = query.trim();
        if query.len() < MIN_SUGGESTION_QUERY_LEN {
            return Ok(Vec::new());
        }
        Ok(self.geocoder.search(query).await?)
    }
}

/// Maps a geocoder country name onto the classification enum; places
/// outside the tracked countries classify as [`Country::Other`].
fn classify_country(name: &str) -> Country {
    name.parse().unwrap_or(Country::Other)
}
