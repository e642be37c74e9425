//! Marker placement with co-location fan-out.
//!
//! Incidents frequently share a coordinate (same reported landmark, same
//! address resolved twice). Stacked markers are individually unclickable,
//! so co-located incidents fan out into a spiral of offset display
//! positions while the true coordinates on the incidents stay untouched.
//!
//! [`place`] is a pure function of the incident list: replaying it over the
//! same list reproduces bit-identical offsets, so a full rebuild on every
//! reload is safe. Input order matters and is fixed by the store's
//! recency sort.

use std::collections::BTreeMap;

use incident_map_incident_models::{Coordinate, Incident};

/// Decimal places used when rounding coordinates into a co-location key.
///
/// Five places is roughly a one-meter grid at the equator, tight enough
/// that only genuinely co-reported positions collide.
pub const COORD_KEY_PRECISION: u32 = 5;

const KEY_SCALE: f64 = 100_000.0;

/// Number of angular slots in the fan-out circle.
pub const SPIRAL_SLOTS: u32 = 8;

/// Radial offset of the first marker at a key, in degrees (~17 m at the
/// equator).
pub const SPIRAL_BASE_OFFSET_DEG: f64 = 1.5e-4;

/// Radial growth factor per additional marker at the same key.
const SPIRAL_GROWTH: f64 = 0.5;

/// Fixed-precision grid key identifying co-located incidents.
///
/// Stored as integer hundred-thousandths of a degree so equality and
/// ordering are exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoordKey {
    lat_e5: i64,
    lng_e5: i64,
}

impl CoordKey {
    /// Builds the key for a coordinate by rounding both components to
    /// [`COORD_KEY_PRECISION`] decimal places.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            lat_e5: (coordinate.latitude * KEY_SCALE).round() as i64,
            lng_e5: (coordinate.longitude * KEY_SCALE).round() as i64,
        }
    }
}

/// One placement decision: which incident, rendered where.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedMarker {
    /// Index of the incident in the input slice.
    pub incident_idx: usize,
    /// Display position, offset from the true coordinate when co-located.
    pub display: Coordinate,
}

/// Computes display positions for every placeable incident.
///
/// Incidents without a definite coordinate produce no entry. The Nth
/// incident (0-indexed) sharing a [`CoordKey`] is displaced along a circle
/// of [`SPIRAL_SLOTS`] angular slots with radius growing in N, so
/// co-located markers fan out into a readable spiral.
#[must_use]
pub fn place(incidents: &[Incident]) -> Vec<PlacedMarker> {
    let mut counts: BTreeMap<CoordKey, u32> = BTreeMap::new();
    let mut placed = Vec::new();

    for (incident_idx, incident) in incidents.iter().enumerate() {
        let Some(coordinate) = incident.coordinate() else {
            continue;
        };
        let slot = counts.entry(CoordKey::new(coordinate)).or_insert(0);
        placed.push(PlacedMarker {
            incident_idx,
            display: spiral_offset(coordinate, *slot),
        });
        *slot += 1;
    }

    placed
}

/// Display position for the Nth marker at a shared key.
fn spiral_offset(origin: Coordinate, n: u32) -> Coordinate {
    let angle = std::f64::consts::TAU * f64::from(n) / f64::from(SPIRAL_SLOTS);
    let radius = SPIRAL_BASE_OFFSET_DEG * SPIRAL_GROWTH.mul_add(f64::from(n), 1.0);
    Coordinate {
        latitude: radius.mul_add(angle.sin(), origin.latitude),
        longitude: radius.mul_add(angle.cos(), origin.longitude),
    }
}
