//! The map session controller.
//!
//! [`MapSession`] is the single holder of all client-side map state: the
//! incident store, the derived marker list, the active filter, the current
//! country view, and the in-flight submission flag. Everything the UI does
//! funnels through here, so no state is reachable outside the store and
//! filter contracts.

use std::sync::Arc;

use chrono::Utc;
use incident_map_client::{ClientError, IncidentApi};
use incident_map_client_models::SubscribeRequest;
use incident_map_geocoder::{GeocodedPlace, Geocoder};
use incident_map_incident_models::{Coordinate, Country, Incident};

use crate::filter::{FilterConfig, FilterEngine};
use crate::placement;
use crate::report::{self, ReportDraft, SubmitError};
use crate::resolver::{CoordinateInput, CoordinateResolver, ResolveError, ResolvedCoordinate};
use crate::store::IncidentStore;
use crate::surface::{MapSurface, Marker};

/// Client-side controller for one map view.
pub struct MapSession<S: MapSurface> {
    backend: Arc<dyn IncidentApi>,
    resolver: CoordinateResolver,
    store: IncidentStore,
    markers: Vec<Marker>,
    filter: FilterConfig,
    country: Country,
    surface: S,
    submitting: bool,
}

impl<S: MapSurface> MapSession<S> {
    /// Creates a session focused on the default country view.
    pub fn new(backend: Arc<dyn IncidentApi>, geocoder: Arc<dyn Geocoder>, mut surface: S) -> Self {
        let country = Country::Sudan;
        surface.set_view(country.map_center(), country.default_zoom());
        Self {
            backend,
            resolver: CoordinateResolver::new(geocoder),
            store: IncidentStore::new(),
            markers: Vec::new(),
            filter: FilterConfig::default(),
            country,
            surface,
            submitting: false,
        }
    }

    /// Discards the current incidents and markers, fetches the full list
    /// from the backend, and rebuilds the projection.
    ///
    /// Idempotent: an unchanged backend response yields the same visible
    /// state. If a newer load started while this one's response was in
    /// flight, the stale response is discarded and the newer state stands.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the fetch fails; the previous state is
    /// kept in that case.
    pub async fn load(&mut self) -> Result<(), ClientError> {
        let token = self.store.begin_load();
        let fetched = self.backend.fetch_incidents().await?;
        let incidents: Vec<Incident> = fetched.into_iter().map(Incident::from).collect();
        if self.store.commit(token, incidents) {
            self.rebuild_markers();
        }
        Ok(())
    }

    /// Replaces the filter configuration and re-evaluates visibility.
    pub fn set_filter(&mut self, filter: FilterConfig) {
        self.filter = filter;
        FilterEngine::apply(
            &self.filter,
            Utc::now(),
            &self.store,
            &mut self.markers,
            &mut self.surface,
        );
    }

    /// Switches the country view: recenters the map and drops the
    /// temporary pin, which referred to the previous view.
    pub fn set_country(&mut self, country: Country) {
        self.country = country;
        self.surface
            .set_view(country.map_center(), country.default_zoom());
        self.surface.clear_temp_marker();
    }

    /// Handles a click on the map: resolves the position (rounding it for
    /// display and best-effort reverse-geocoding the country), drops the
    /// temporary pin there, and returns the resolution for form prefill.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError`] if the click coordinate is out of range.
    pub async fn click_map(
        &mut self,
        latitude: f64,
        longitude: f64,
    ) -> Result<ResolvedCoordinate, ResolveError> {
        let resolved = self
            .resolver
            .resolve(CoordinateInput::MapClick {
                latitude,
                longitude,
            })
            .await?;
        self.surface.set_temp_marker(resolved.coordinate);
        Ok(resolved)
    }

    /// Forward-search candidates for the address suggestion dropdown.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Upstream`] when the geocoding call fails.
    pub async fn suggestions(&self, query: &str) -> Result<Vec<GeocodedPlace>, ResolveError> {
        self.resolver.suggestions(query).await
    }

    /// Adopts an address suggestion: pins the candidate's position and
    /// returns the resolution for form prefill.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Validation`] if the candidate carries an
    /// out-of-range coordinate.
    pub fn select_suggestion(
        &mut self,
        place: &GeocodedPlace,
    ) -> Result<ResolvedCoordinate, ResolveError> {
        let coordinate = Coordinate::new(place.latitude, place.longitude)?;
        self.surface.set_temp_marker(coordinate);
        Ok(ResolvedCoordinate {
            coordinate,
            country: None,
            matched_address: place.display_name.clone(),
        })
    }

    /// Runs the full submission flow:
    /// validate → resolve address → submit → reload.
    ///
    /// The in-flight flag is taken synchronously before the first await and
    /// released on every exit path, so a double-click cannot race two
    /// submissions past validation. On success the store is reloaded from
    /// the backend; the just-submitted draft is never appended locally,
    /// since the backend owns `id` and `verified`.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError`] describing the failing phase; see the
    /// variants for the taxonomy.
    pub async fn submit_report(&mut self, draft: ReportDraft) -> Result<(), SubmitError> {
        self.begin_submission()?;
        let result = self.submit_inner(draft).await;
        self.submitting = false;
        result
    }

    fn begin_submission(&mut self) -> Result<(), SubmitError> {
        if self.submitting {
            return Err(SubmitError::InFlight);
        }
        self.submitting = true;
        Ok(())
    }

    async fn submit_inner(&mut self, draft: ReportDraft) -> Result<(), SubmitError> {
        log::debug!("Validating report draft");
        report::validate(&draft)?;

        let mut request = report::to_request(&draft);
        if request.latitude.is_none()
            && let Some(address) = draft.trimmed_address()
        {
            log::debug!("Resolving report address");
            match self
                .resolver
                .resolve(CoordinateInput::Address {
                    address: address.to_string(),
                })
                .await
            {
                Ok(resolved) => {
                    request.latitude = Some(resolved.coordinate.latitude);
                    request.longitude = Some(resolved.coordinate.longitude);
                }
                Err(e) => {
                    // The raw address still ships; the backend can geocode
                    // it server-side.
                    log::warn!("Address resolution failed: {e}");
                }
            }
        }

        log::debug!("Submitting report");
        match self.backend.submit_report(&request).await {
            Ok(ack) => log::info!("Report accepted (id {:?})", ack.id),
            Err(ClientError::Rejected { message }) => {
                return Err(SubmitError::Rejected { message });
            }
            Err(e) => return Err(SubmitError::Network(e)),
        }

        self.surface.clear_temp_marker();
        self.load().await.map_err(SubmitError::Network)
    }

    /// Registers an email subscription after checking the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Validation`] when name, email, or address is
    /// blank, [`SubmitError::Rejected`] for backend rejections, and
    /// [`SubmitError::Network`] for transport failures.
    pub async fn subscribe(&self, request: &SubscribeRequest) -> Result<(), SubmitError> {
        if request.name.trim().is_empty()
            || request.email.trim().is_empty()
            || request.address.trim().is_empty()
        {
            return Err(SubmitError::Validation {
                message: "name, email, and address are required".to_string(),
            });
        }
        match self.backend.subscribe(request).await {
            Ok(_) => Ok(()),
            Err(ClientError::Rejected { message }) => Err(SubmitError::Rejected { message }),
            Err(e) => Err(SubmitError::Network(e)),
        }
    }

    /// Discards and recreates every marker from the store, then reapplies
    /// the active filter.
    fn rebuild_markers(&mut self) {
        // Dispose the old projection completely before the new one exists.
        for marker in &self.markers {
            if marker.visible {
                self.surface.remove_marker(marker.id);
            }
        }
        self.markers = placement::place(self.store.incidents())
            .into_iter()
            .map(|p| Marker::new(p.incident_idx, p.display))
            .collect();
        FilterEngine::apply(
            &self.filter,
            Utc::now(),
            &self.store,
            &mut self.markers,
            &mut self.surface,
        );
    }

    /// The canonical incident store.
    #[must_use]
    pub const fn store(&self) -> &IncidentStore {
        &self.store
    }

    /// The current marker projection.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Number of markers currently visible on the surface.
    #[must_use]
    pub fn visible_marker_count(&self) -> usize {
        self.markers.iter().filter(|m| m.visible).count()
    }

    /// The rendering surface.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The active filter configuration.
    #[must_use]
    pub const fn filter(&self) -> &FilterConfig {
        &self.filter
    }

    /// The country the view is focused on.
    #[must_use]
    pub const fn country(&self) -> Country {
        self.country
    }

    /// Whether a submission is currently in flight.
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use incident_map_client_models::{ApiIncident, ApiStatus, ReportRequest, StatusResponse};
    use incident_map_geocoder::GeocodeError;

    use crate::filter::FilterStatus;
    use crate::surface::InMemorySurface;

    /// Backend double that applies submitted reports to its own list, so a
    /// reload observes them the way the real backend would.
    #[derive(Default)]
    struct MockBackend {
        incidents: Mutex<Vec<ApiIncident>>,
        fetch_calls: AtomicUsize,
        submit_calls: AtomicUsize,
        subscribe_calls: AtomicUsize,
        last_report: Mutex<Option<ReportRequest>>,
        reject_message: Option<String>,
    }

    impl MockBackend {
        fn with_incidents(incidents: Vec<ApiIncident>) -> Self {
            Self {
                incidents: Mutex::new(incidents),
                ..Self::default()
            }
        }

        fn rejecting(message: &str) -> Self {
            Self {
                reject_message: Some(message.to_string()),
                ..Self::default()
            }
        }

        fn fetch_count(&self) -> usize {
            self.fetch_calls.load(Ordering::SeqCst)
        }

        fn submit_count(&self) -> usize {
            self.submit_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl IncidentApi for MockBackend {
        async fn fetch_incidents(&self) -> Result<Vec<ApiIncident>, ClientError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.incidents.lock().unwrap().clone())
        }

        async fn submit_report(
            &self,
            request: &ReportRequest,
        ) -> Result<StatusResponse, ClientError> {
            self.submit_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_report.lock().unwrap() = Some(request.clone());
            if let Some(message) = &self.reject_message {
                return Err(ClientError::Rejected {
                    message: message.clone(),
                });
            }
            let mut incidents = self.incidents.lock().unwrap();
            let id = i64::try_from(incidents.len()).unwrap() + 1;
            incidents.push(ApiIncident {
                id: Some(id),
                latitude: request.latitude,
                longitude: request.longitude,
                datetime: request.date_time.clone(),
                description: request.description.clone(),
                source: request.source.clone(),
                image_url: None,
                verified: false,
                address: request.address.clone(),
                country: request.country.clone(),
            });
            Ok(StatusResponse {
                status: ApiStatus::Success,
                message: None,
                id: Some(id),
            })
        }

        async fn subscribe(
            &self,
            _request: &SubscribeRequest,
        ) -> Result<StatusResponse, ClientError> {
            self.subscribe_calls.fetch_add(1, Ordering::SeqCst);
            Ok(StatusResponse {
                status: ApiStatus::Success,
                message: None,
                id: None,
            })
        }
    }

    /// Geocoder double with canned candidates.
    #[derive(Default)]
    struct MockGeocoder {
        places: Vec<GeocodedPlace>,
        reverse_place: Option<GeocodedPlace>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Geocoder for MockGeocoder {
        async fn search(&self, _query: &str) -> Result<Vec<GeocodedPlace>, GeocodeError> {
            if self.fail {
                return Err(GeocodeError::Parse {
                    message: "boom".to_string(),
                });
            }
            Ok(self.places.clone())
        }

        async fn reverse(
            &self,
            _latitude: f64,
            _longitude: f64,
        ) -> Result<Option<GeocodedPlace>, GeocodeError> {
            if self.fail {
                return Err(GeocodeError::Parse {
                    message: "boom".to_string(),
                });
            }
            Ok(self.reverse_place.clone())
        }
    }

    fn api_incident(id: i64, lat: f64, lng: f64, verified: bool) -> ApiIncident {
        ApiIncident {
            id: Some(id),
            latitude: Some(lat),
            longitude: Some(lng),
            datetime: "2024-05-01T12:00:00Z".to_string(),
            description: format!("incident {id}"),
            source: None,
            image_url: None,
            verified,
            address: None,
            country: Some("Sudan".to_string()),
        }
    }

    fn session(
        backend: Arc<MockBackend>,
        geocoder: MockGeocoder,
    ) -> MapSession<InMemorySurface> {
        MapSession::new(backend, Arc::new(geocoder), InMemorySurface::new())
    }

    fn draft() -> ReportDraft {
        ReportDraft {
            date_time: "2024-05-02T08:30".to_string(),
            latitude: Some(15.6),
            longitude: Some(32.6),
            description: "checkpoint established".to_string(),
            ..ReportDraft::default()
        }
    }

    #[test]
    fn new_session_focuses_default_country() {
        let s = session(Arc::new(MockBackend::default()), MockGeocoder::default());
        let (center, zoom) = s.surface().view().unwrap();
        assert!((center.latitude - 15.5007).abs() < 1e-9);
        assert_eq!(zoom, 6);
        assert_eq!(s.country(), Country::Sudan);
    }

    #[tokio::test]
    async fn load_places_markers_for_placeable_incidents() {
        let mut sparse = api_incident(3, 0.0, 0.0, false);
        sparse.latitude = None;
        sparse.longitude = None;
        let backend = Arc::new(MockBackend::with_incidents(vec![
            api_incident(1, 15.5, 32.5, false),
            api_incident(2, 15.5, 32.5, true),
            sparse,
        ]));
        let mut s = session(backend, MockGeocoder::default());

        s.load().await.unwrap();

        assert_eq!(s.store().len(), 3);
        assert_eq!(s.markers().len(), 2);
        assert_eq!(s.visible_marker_count(), 2);
        assert_eq!(s.surface().marker_count(), 2);
    }

    #[tokio::test]
    async fn reload_is_idempotent_and_disposes_old_handles() {
        let backend = Arc::new(MockBackend::with_incidents(vec![
            api_incident(1, 15.5, 32.5, false),
            api_incident(2, 15.6, 32.6, false),
        ]));
        let mut s = session(backend, MockGeocoder::default());

        s.load().await.unwrap();
        let first_ids: Vec<_> = s.surface().markers().keys().copied().collect();
        assert_eq!(first_ids.len(), 2);

        s.load().await.unwrap();
        assert_eq!(s.surface().marker_count(), 2);
        for id in &first_ids {
            assert!(
                !s.surface().markers().contains_key(id),
                "stale marker handle survived the reload"
            );
        }
    }

    #[tokio::test]
    async fn filter_hides_and_restores_markers() {
        let backend = Arc::new(MockBackend::with_incidents(vec![
            api_incident(1, 15.5, 32.5, true),
            api_incident(2, 15.6, 32.6, false),
        ]));
        let mut s = session(backend, MockGeocoder::default());
        s.load().await.unwrap();

        s.set_filter(FilterConfig {
            status: FilterStatus::Verified,
            ..FilterConfig::default()
        });
        assert_eq!(s.visible_marker_count(), 1);
        assert_eq!(s.store().len(), 2, "filtering must not touch the store");

        s.set_filter(FilterConfig::default());
        assert_eq!(s.visible_marker_count(), 2);
    }

    #[tokio::test]
    async fn invalid_draft_makes_no_network_calls() {
        let backend = Arc::new(MockBackend::default());
        let mut s = session(backend.clone(), MockGeocoder::default());

        let mut bad = draft();
        bad.description = "  ".to_string();
        let result = s.submit_report(bad).await;

        assert!(matches!(result, Err(SubmitError::Validation { .. })));
        assert_eq!(backend.submit_count(), 0);
        assert_eq!(backend.fetch_count(), 0);
        assert!(!s.is_submitting());
    }

    #[tokio::test]
    async fn successful_submit_reloads_exactly_once_and_shows_the_marker() {
        let backend = Arc::new(MockBackend::with_incidents(vec![api_incident(
            1, 15.5, 32.5, true,
        )]));
        let mut s = session(backend.clone(), MockGeocoder::default());
        s.load().await.unwrap();
        let fetches_before = backend.fetch_count();

        s.submit_report(draft()).await.unwrap();

        assert_eq!(backend.submit_count(), 1);
        assert_eq!(backend.fetch_count(), fetches_before + 1);
        assert_eq!(s.store().len(), 2);
        assert!(
            s.store()
                .incidents()
                .iter()
                .any(|i| i.description == "checkpoint established" && i.id.is_some()),
            "submitted incident missing after reload"
        );
        assert_eq!(s.visible_marker_count(), 2);
        assert!(!s.is_submitting());
    }

    #[tokio::test]
    async fn rejected_submit_surfaces_message_and_skips_reload() {
        let backend = Arc::new(MockBackend::rejecting("description too short"));
        let mut s = session(backend.clone(), MockGeocoder::default());

        let result = s.submit_report(draft()).await;

        match result {
            Err(SubmitError::Rejected { message }) => {
                assert_eq!(message, "description too short");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
        assert_eq!(backend.fetch_count(), 0);
        assert!(!s.is_submitting());
    }

    #[tokio::test]
    async fn address_resolution_fills_coordinates() {
        let backend = Arc::new(MockBackend::default());
        let geocoder = MockGeocoder {
            places: vec![GeocodedPlace {
                latitude: 31.9522,
                longitude: 35.2332,
                display_name: Some("Ramallah".to_string()),
                country: Some("Palestine".to_string()),
            }],
            ..MockGeocoder::default()
        };
        let mut s = session(backend.clone(), geocoder);

        let mut d = draft();
        d.latitude = None;
        d.longitude = None;
        d.address = Some("Ramallah".to_string());
        s.submit_report(d).await.unwrap();

        let sent = backend.last_report.lock().unwrap().clone().unwrap();
        assert_eq!(sent.latitude, Some(31.9522));
        assert_eq!(sent.longitude, Some(35.2332));
        assert_eq!(sent.address.as_deref(), Some("Ramallah"));
    }

    #[tokio::test]
    async fn address_resolution_failure_still_ships_raw_address() {
        let backend = Arc::new(MockBackend::default());
        let geocoder = MockGeocoder {
            fail: true,
            ..MockGeocoder::default()
        };
        let mut s = session(backend.clone(), geocoder);

        let mut d = draft();
        d.latitude = None;
        d.longitude = None;
        d.address = Some("Omdurman market".to_string());
        s.submit_report(d).await.unwrap();

        let sent = backend.last_report.lock().unwrap().clone().unwrap();
        assert_eq!(sent.latitude, None);
        assert_eq!(sent.address.as_deref(), Some("Omdurman market"));
    }

    #[test]
    fn in_flight_guard_blocks_second_submission() {
        let mut s = session(Arc::new(MockBackend::default()), MockGeocoder::default());
        s.begin_submission().unwrap();
        assert!(matches!(s.begin_submission(), Err(SubmitError::InFlight)));
    }

    #[tokio::test]
    async fn set_country_recenters_and_clears_temp_pin() {
        let mut s = session(Arc::new(MockBackend::default()), MockGeocoder::default());
        s.click_map(48.4, 31.2).await.unwrap();
        assert!(s.surface().temp_marker().is_some());

        s.set_country(Country::Ukraine);

        assert_eq!(s.country(), Country::Ukraine);
        assert!(s.surface().temp_marker().is_none());
        let (center, zoom) = s.surface().view().unwrap();
        assert!((center.latitude - 48.3794).abs() < 1e-9);
        assert_eq!(zoom, 6);
    }

    #[tokio::test]
    async fn click_map_pins_and_prefills() {
        let geocoder = MockGeocoder {
            reverse_place: Some(GeocodedPlace {
                latitude: 15.5,
                longitude: 32.5,
                display_name: Some("Khartoum".to_string()),
                country: Some("Sudan".to_string()),
            }),
            ..MockGeocoder::default()
        };
        let mut s = session(Arc::new(MockBackend::default()), geocoder);

        let resolved = s.click_map(15.123_456_789, 32.5).await.unwrap();

        assert!((resolved.coordinate.latitude - 15.123_457).abs() < 1e-9);
        assert_eq!(resolved.country, Some(Country::Sudan));
        assert_eq!(s.surface().temp_marker(), Some(resolved.coordinate));
    }

    #[tokio::test]
    async fn subscribe_validates_required_fields() {
        let backend = Arc::new(MockBackend::default());
        let s = session(backend.clone(), MockGeocoder::default());

        let blank = SubscribeRequest {
            name: "  ".to_string(),
            email: "user@example.org".to_string(),
            address: "Khartoum".to_string(),
            latitude: None,
            longitude: None,
        };
        assert!(matches!(
            s.subscribe(&blank).await,
            Err(SubmitError::Validation { .. })
        ));
        assert_eq!(backend.subscribe_calls.load(Ordering::SeqCst), 0);

        let complete = SubscribeRequest {
            name: "A. Subscriber".to_string(),
            email: "user@example.org".to_string(),
            address: "Khartoum".to_string(),
            latitude: Some(15.5),
            longitude: Some(32.5),
        };
        s.subscribe(&complete).await.unwrap();
        assert_eq!(backend.subscribe_calls.load(Ordering::SeqCst), 1);
    }
}
