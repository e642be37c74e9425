#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incident map reconciliation engine.
//!
//! Owns the client-side model of the incident map: the canonical incident
//! list ([`IncidentStore`]), its disposable marker projection
//! ([`place`] + [`Marker`]), filter-driven visibility ([`FilterEngine`]),
//! coordinate resolution ([`CoordinateResolver`]), and the report
//! submission flow, all coordinated by a [`MapSession`].
//!
//! The engine talks to the outside world only through three seams: the
//! backend ([`incident_map_client::IncidentApi`]), the geocoder
//! ([`incident_map_geocoder::Geocoder`]), and the rendering surface
//! ([`MapSurface`]). Markers are a derived projection that can be rebuilt
//! from the store at any time, which is what makes reload-based
//! consistency correct.

pub mod filter;
pub mod placement;
pub mod report;
pub mod resolver;
pub mod session;
pub mod store;
pub mod surface;

pub use filter::{FilterConfig, FilterEngine, FilterStatus, RadiusFilter};
pub use placement::{COORD_KEY_PRECISION, CoordKey, PlacedMarker, place};
pub use report::{ReportDraft, SubmitError};
pub use resolver::{CoordinateInput, CoordinateResolver, ResolveError, ResolvedCoordinate};
pub use session::MapSession;
pub use store::{IncidentStore, LoadToken};
pub use surface::{InMemorySurface, MapSurface, Marker, MarkerId};
