//! Filter predicates and marker visibility.
//!
//! The filter engine decides which markers sit on the surface; it never
//! touches the store. Every control change re-evaluates the full marker
//! list against a [`FilterConfig`]: no incremental bookkeeping, and
//! applying the same configuration twice is a no-op.

use chrono::{DateTime, Duration, Utc};
use incident_map_incident_models::{Coordinate, Country, Incident};
use strum_macros::{AsRefStr, Display, EnumString};

use crate::store::IncidentStore;
use crate::surface::{MapSurface, Marker};

/// Verification / recency predicate selected by the filter control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum FilterStatus {
    /// Every incident passes.
    #[default]
    All,
    /// Only backend-verified incidents.
    Verified,
    /// Only incidents awaiting verification.
    Unverified,
    /// Occurred within the last 24 hours.
    Recent,
    /// Occurred within the last 7 days.
    Week,
    /// Occurred within the last 30 days.
    Month,
    /// Occurred within the last 90 days.
    #[strum(serialize = "3months")]
    ThreeMonths,
}

impl FilterStatus {
    /// The time window for recency predicates, `None` for the rest.
    #[must_use]
    pub fn window(self) -> Option<Duration> {
        match self {
            Self::All | Self::Verified | Self::Unverified => None,
            Self::Recent => Some(Duration::hours(24)),
            Self::Week => Some(Duration::days(7)),
            Self::Month => Some(Duration::days(30)),
            Self::ThreeMonths => Some(Duration::days(90)),
        }
    }

    /// Whether `incident` passes this predicate at evaluation time `now`.
    ///
    /// An incident whose timestamp cannot be parsed never matches a time
    /// window (fails closed).
    #[must_use]
    pub fn matches(self, incident: &Incident, now: DateTime<Utc>) -> bool {
        match self {
            Self::All => true,
            Self::Verified => incident.verified,
            Self::Unverified => !incident.verified,
            Self::Recent | Self::Week | Self::Month | Self::ThreeMonths => {
                let Some(window) = self.window() else {
                    return false;
                };
                incident
                    .occurred_at()
                    .is_some_and(|at| now.signed_duration_since(at) <= window)
            }
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::All,
            Self::Verified,
            Self::Unverified,
            Self::Recent,
            Self::Week,
            Self::Month,
            Self::ThreeMonths,
        ]
    }
}

/// Distance predicate: show only incidents within `km` of `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusFilter {
    /// Center of the circle.
    pub center: Coordinate,
    /// Radius in kilometers.
    pub km: f64,
}

/// The complete, explicit filter state.
///
/// Dimensions are independent and conjunctive: a marker stays visible only
/// if it passes every active predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterConfig {
    /// Verification / recency predicate.
    pub status: FilterStatus,
    /// Country-equality predicate, off when `None`.
    pub country: Option<Country>,
    /// Distance predicate, off when `None`.
    pub radius: Option<RadiusFilter>,
}

impl FilterConfig {
    /// Whether `incident` passes every active predicate at `now`.
    #[must_use]
    pub fn matches(&self, incident: &Incident, now: DateTime<Utc>) -> bool {
        if !self.status.matches(incident, now) {
            return false;
        }
        if let Some(country) = self.country
            && incident.country != Some(country)
        {
            return false;
        }
        if let Some(radius) = self.radius {
            // An incident with no definite coordinate cannot be inside any
            // circle.
            return incident.coordinate().is_some_and(|at| {
                haversine_km(radius.center, at) <= radius.km
            });
        }
        true
    }
}

/// Applies filter state to marker visibility.
pub struct FilterEngine;

impl FilterEngine {
    /// Re-evaluates every marker against `config`, adding or removing it
    /// from the surface as needed.
    ///
    /// Only marker visibility changes; the store is read-only here.
    /// Idempotent: a marker already in the right state is left alone.
    pub fn apply<S: MapSurface>(
        config: &FilterConfig,
        now: DateTime<Utc>,
        store: &IncidentStore,
        markers: &mut [Marker],
        surface: &mut S,
    ) {
        for marker in markers {
            let Some(incident) = store.incidents().get(marker.incident_idx) else {
                continue;
            };
            let show = config.matches(incident, now);
            if show && !marker.visible {
                surface.add_marker(marker.id, marker.display);
                marker.visible = true;
            } else if !show && marker.visible {
                surface.remove_marker(marker.id);
                marker.visible = false;
            }
        }
    }
}

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers.
#[must_use]
pub fn haversine_km(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
