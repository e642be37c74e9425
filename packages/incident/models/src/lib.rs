#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Canonical incident domain types.
//!
//! This crate defines the shared data model used across the entire
//! incident-map system: the [`Incident`] record as held in the client-side
//! store, validated WGS84 [`Coordinate`]s, the [`Country`] classification
//! with its map view presets, and inline image payload validation.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Maximum accepted size of an inline image payload, in decoded bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// A definite WGS84 latitude/longitude pair.
///
/// Construction through [`Coordinate::new`] guarantees both components are
/// finite and in range, so a held `Coordinate` is always placeable on the
/// map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, [-90, 90].
    pub latitude: f64,
    /// Longitude in degrees, [-180, 180].
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate, validating range and finiteness.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if either component is non-finite
    /// or out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinateError::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Returns this coordinate rounded to `places` decimal digits.
    #[must_use]
    pub fn rounded(self, places: i32) -> Self {
        let factor = 10f64.powi(places);
        Self {
            latitude: (self.latitude * factor).round() / factor,
            longitude: (self.longitude * factor).round() / factor,
        }
    }
}

/// Error returned when constructing a [`Coordinate`] from out-of-range or
/// non-finite components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InvalidCoordinateError {
    /// Latitude outside [-90, 90] or non-finite.
    Latitude(f64),
    /// Longitude outside [-180, 180] or non-finite.
    Longitude(f64),
}

impl std::fmt::Display for InvalidCoordinateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Latitude(v) => write!(f, "invalid latitude {v}: expected [-90, 90]"),
            Self::Longitude(v) => write!(f, "invalid longitude {v}: expected [-180, 180]"),
        }
    }
}

impl std::error::Error for InvalidCoordinateError {}

/// Country classification for an incident, with the map view preset used
/// when the map focuses on that country.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Country {
    /// Sudan.
    Sudan,
    /// Palestine.
    Palestine,
    /// Ukraine.
    Ukraine,
    /// Anywhere else; the map falls back to a whole-world view.
    Other,
}

impl Country {
    /// Returns the map center for this country's view preset.
    #[must_use]
    pub const fn map_center(self) -> Coordinate {
        match self {
            Self::Sudan => Coordinate {
                latitude: 15.5007,
                longitude: 32.5599,
            },
            Self::Palestine => Coordinate {
                latitude: 31.9522,
                longitude: 35.2332,
            },
            Self::Ukraine => Coordinate {
                latitude: 48.3794,
                longitude: 31.1656,
            },
            Self::Other => Coordinate {
                latitude: 0.0,
                longitude: 0.0,
            },
        }
    }

    /// Returns the initial zoom level for this country's view preset.
    #[must_use]
    pub const fn default_zoom(self) -> u8 {
        match self {
            Self::Other => 2,
            _ => 6,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Sudan, Self::Palestine, Self::Ukraine, Self::Other]
    }
}

/// An incident as held in the client-side store.
///
/// Records arrive from the backend (with `id` and `verified` set by the
/// server) or are constructed locally before submission (with `id` absent).
/// `verified` is backend-owned and never mutated client-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Backend-assigned identifier; `None` before submission.
    pub id: Option<i64>,
    /// Latitude in degrees, if known.
    pub latitude: Option<f64>,
    /// Longitude in degrees, if known.
    pub longitude: Option<f64>,
    /// Raw timestamp string as entered or received; parsed on demand via
    /// [`Incident::occurred_at`].
    pub date_time: String,
    /// Required description of what happened.
    pub description: String,
    /// Optional source URL backing the report.
    pub source: Option<String>,
    /// Optional free-text location; display fallback and geocoding input.
    pub address: Option<String>,
    /// Optional country classification.
    pub country: Option<Country>,
    /// Optional photo evidence: an inline data URL or a backend image URL.
    pub image: Option<String>,
    /// Whether the backend has verified this report.
    pub verified: bool,
}

impl Incident {
    /// Returns the incident's definite coordinate, if it has one.
    ///
    /// An incident is *placeable* (eligible for a map marker) exactly when
    /// this returns `Some`. Out-of-range stored values yield `None` rather
    /// than a marker in an impossible position.
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Coordinate::new(lat, lng).ok(),
            _ => None,
        }
    }

    /// Parses the raw `date_time` string into a UTC instant.
    ///
    /// Accepts RFC 3339, the HTML `datetime-local` format
    /// (`2024-05-01T13:45` with optional seconds), and a plain
    /// `2024-05-01 13:45:00`. Returns `None` for anything else; callers
    /// treat an unparsable timestamp as never matching a time window.
    #[must_use]
    pub fn occurred_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.date_time.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
                return Some(naive.and_utc());
            }
        }
        None
    }
}

/// Error returned when an inline image payload is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// The payload is not a `data:image/*;base64,` URL.
    NotAnImage,
    /// The decoded payload exceeds [`MAX_IMAGE_BYTES`].
    TooLarge {
        /// Approximate decoded size in bytes.
        size: usize,
    },
}

impl std::fmt::Display for ImageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAnImage => {
                write!(f, "image payload must be a base64 data URL with an image MIME type")
            }
            Self::TooLarge { size } => write!(
                f,
                "image payload is {size} bytes decoded; maximum is {MAX_IMAGE_BYTES}"
            ),
        }
    }
}

impl std::error::Error for ImageError {}

/// Validates an inline image payload before it is attached to a report.
///
/// The payload must be a `data:image/<subtype>;base64,<data>` URL and its
/// decoded size must not exceed [`MAX_IMAGE_BYTES`]. The size check is
/// computed from the base64 text length, so the payload is never decoded.
///
/// # Errors
///
/// Returns [`ImageError`] if the payload is not an image data URL or is too
/// large.
pub fn validate_image_data_url(payload: &str) -> Result<(), ImageError> {
    let Some(rest) = payload.strip_prefix("data:image/") else {
        return Err(ImageError::NotAnImage);
    };
    let Some((_subtype, data)) = rest.split_once(";base64,") else {
        return Err(ImageError::NotAnImage);
    };

    let padding = data.bytes().rev().take_while(|b| *b == b'=').count();
    let decoded = (data.len() / 4 * 3).saturating_sub(padding);
    if decoded > MAX_IMAGE_BYTES {
        return Err(ImageError::TooLarge { size: decoded });
    }
    Ok(())
}
