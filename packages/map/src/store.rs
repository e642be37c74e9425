//! Canonical in-memory incident collection.
//!
//! The store is the single owner of incident data on the client; markers
//! and filter state are derived projections rebuilt from it. Repopulation
//! happens wholesale: a load discards everything and installs the
//! backend's list, sorted most-recent-first so marker placement and the
//! recency filters see a consistent order without secondary sorts.
//!
//! Overlapping loads are serialized by a generation counter: only the
//! newest [`LoadToken`] can commit, so a slow stale response can never
//! overwrite fresher data.

use std::cmp::Reverse;

use incident_map_incident_models::Incident;

/// Token identifying one load attempt. Issued by
/// [`IncidentStore::begin_load`], consumed by [`IncidentStore::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadToken(u64);

/// The ordered collection of known incidents.
#[derive(Debug, Default)]
pub struct IncidentStore {
    incidents: Vec<Incident>,
    generation: u64,
}

impl IncidentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the start of a load and returns its token.
    ///
    /// Starting a newer load invalidates every earlier outstanding token.
    pub const fn begin_load(&mut self) -> LoadToken {
        self.generation += 1;
        LoadToken(self.generation)
    }

    /// Installs a fetched incident list, unless a newer load has started
    /// since `token` was issued.
    ///
    /// Returns `true` when the list was installed. The list is sorted by
    /// occurrence time descending; incidents with unparsable timestamps
    /// sort last. Co-located records are all retained; visual
    /// deduplication is marker placement's job, not the store's.
    pub fn commit(&mut self, token: LoadToken, mut incidents: Vec<Incident>) -> bool {
        if token.0 != self.generation {
            log::debug!(
                "Discarding superseded load (token {}, current generation {})",
                token.0,
                self.generation
            );
            return false;
        }
        sort_by_recency(&mut incidents);
        self.incidents = incidents;
        true
    }

    /// Appends one locally constructed incident, keeping the recency order.
    ///
    /// The submission flow prefers a full reload over this (the backend is
    /// the sole source of truth for `id` and `verified`), but local
    /// insertion remains available for offline-style callers.
    pub fn append(&mut self, incident: Incident) {
        self.incidents.push(incident);
        sort_by_recency(&mut self.incidents);
    }

    /// The current incident list, most recent first.
    #[must_use]
    pub fn incidents(&self) -> &[Incident] {
        &self.incidents
    }

    /// Number of incidents held.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.incidents.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }
}

/// Sorts by parsed occurrence time, newest first, unparsable last. Stable,
/// so equal timestamps keep their backend order.
fn sort_by_recency(incidents: &mut [Incident]) {
    incidents.sort_by_cached_key(|incident| Reverse(incident.occurred_at()));
}
