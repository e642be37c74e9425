//! Map surface abstraction and marker handles.
//!
//! A [`MapSurface`] is whatever renders markers: a tile-map widget in the
//! real frontend, [`InMemorySurface`] in tests and the CLI. The engine only
//! ever adds and removes markers by handle, so surfaces stay trivially
//! swappable.

use std::collections::BTreeMap;

use incident_map_incident_models::Coordinate;
use uuid::Uuid;

/// Opaque handle for one rendered marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MarkerId(Uuid);

impl MarkerId {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// A disposable visual projection of one incident onto the map.
///
/// Markers hold the index of their incident in the store (the store is the
/// sole owner of incident data) and the adjusted display position computed
/// by marker placement, which may differ from the incident's true
/// coordinate when several incidents share a spot. The whole marker list is
/// rebuilt from scratch on every reload.
#[derive(Debug, Clone)]
pub struct Marker {
    /// Surface handle for this marker.
    pub id: MarkerId,
    /// Index of the projected incident in the store's current list.
    pub incident_idx: usize,
    /// Rendered position (true coordinate plus any co-location offset).
    pub display: Coordinate,
    /// Whether the marker is currently on the surface. Managed by the
    /// filter engine; markers start hidden until the first filter pass.
    pub visible: bool,
}

impl Marker {
    pub(crate) fn new(incident_idx: usize, display: Coordinate) -> Self {
        Self {
            id: MarkerId::new(),
            incident_idx,
            display,
            visible: false,
        }
    }
}

/// The rendering operations the engine needs from a map widget.
pub trait MapSurface {
    /// Renders a marker at `position`.
    fn add_marker(&mut self, id: MarkerId, position: Coordinate);

    /// Removes a previously added marker. Removing an unknown handle is a
    /// no-op.
    fn remove_marker(&mut self, id: MarkerId);

    /// Places (or moves) the single temporary pin used while composing a
    /// report.
    fn set_temp_marker(&mut self, position: Coordinate);

    /// Removes the temporary pin, if present.
    fn clear_temp_marker(&mut self);

    /// Recenters the view.
    fn set_view(&mut self, center: Coordinate, zoom: u8);
}

/// Surface implementation that just records state.
///
/// Used by the CLI to report marker positions and by tests to observe the
/// engine's rendering decisions.
#[derive(Debug, Default)]
pub struct InMemorySurface {
    markers: BTreeMap<MarkerId, Coordinate>,
    temp_marker: Option<Coordinate>,
    view: Option<(Coordinate, u8)>,
}

impl InMemorySurface {
    /// Creates an empty surface.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of markers currently rendered.
    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Currently rendered markers, keyed by handle.
    #[must_use]
    pub const fn markers(&self) -> &BTreeMap<MarkerId, Coordinate> {
        &self.markers
    }

    /// The temporary pin position, if one is placed.
    #[must_use]
    pub const fn temp_marker(&self) -> Option<Coordinate> {
        self.temp_marker
    }

    /// The last view set, as `(center, zoom)`.
    #[must_use]
    pub const fn view(&self) -> Option<(Coordinate, u8)> {
        self.view
    }
}

impl MapSurface for InMemorySurface {
    fn add_marker(&mut self, id: MarkerId, position: Coordinate) {
        self.markers.insert(id, position);
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    fn set_temp_marker(&mut self, position: Coordinate) {
        self.temp_marker = Some(position);
    }

    fn clear_temp_marker(&mut self) {
        self.temp_marker = None;
    }

    fn set_view(&mut self, center: Coordinate, zoom: u8) {
        self.view = Some((center, zoom));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_ids_are_unique() {
        let a = Marker::new(0, Coordinate { latitude: 0.0, longitude: 0.0 });
        let b = Marker::new(0, Coordinate { latitude: 0.0, longitude: 0.0 });
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn surface_records_and_removes() {
        let mut surface = InMemorySurface::new();
        let marker = Marker::new(0, Coordinate { latitude: 1.0, longitude: 2.0 });
        surface.add_marker(marker.id, marker.display);
        assert_eq!(surface.marker_count(), 1);
        surface.remove_marker(marker.id);
        assert_eq!(surface.marker_count(), 0);
        // Unknown handle removal is a no-op.
        surface.remove_marker(marker.id);
    }

    #[test]
    fn temp_marker_replaces_previous() {
        let mut surface = InMemorySurface::new();
        surface.set_temp_marker(Coordinate { latitude: 1.0, longitude: 1.0 });
        surface.set_temp_marker(Coordinate { latitude: 2.0, longitude: 2.0 });
        assert_eq!(
            surface.temp_marker(),
            Some(Coordinate { latitude: 2.0, longitude: 2.0 })
        );
        surface.clear_temp_marker();
        assert_eq!(surface.temp_marker(), None);
    }
}
