//! Incident list rows mirrored from registry events.

use crate::model::incident::{Incident, IncidentId};
use crate::registry::events::{IncidentObserver, RegistryEvent};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// One rendered list entry: title plus coordinate subtitle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListRow {
    pub id: IncidentId,
    pub title: String,
    pub subtitle: String,
}

impl From<&Incident> for ListRow {
    fn from(incident: &Incident) -> Self {
        Self {
            id: incident.id(),
            title: incident.title().to_string(),
            subtitle: incident.location().label(),
        }
    }
}

#[derive(Default)]
struct ListState {
    rows: Vec<ListRow>,
    revision: u64,
}

/// Row model for the list/detail UI.
///
/// Applies each event at its reported index, falling back to an id lookup if
/// the row at that index belongs to another incident.
#[derive(Default)]
pub struct IncidentListView {
    state: Mutex<ListState>,
}

impl IncidentListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, incidents: &[Incident]) {
        let mut state = self.lock();
        state.rows = incidents.iter().map(ListRow::from).collect();
        state.revision += 1;
    }

    pub fn rows(&self) -> Vec<ListRow> {
        self.lock().rows.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().rows.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    fn lock(&self) -> MutexGuard<'_, ListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn locate(rows: &[ListRow], index: usize, id: IncidentId) -> Option<usize> {
    match rows.get(index) {
        Some(row) if row.id == id => Some(index),
        _ => rows.iter().position(|row| row.id == id),
    }
}

impl IncidentObserver for IncidentListView {
    fn on_registry_event(&self, event: &RegistryEvent) {
        let mut state = self.lock();
        match event {
            RegistryEvent::IncidentAdded { incident, index } => {
                let at = (*index).min(state.rows.len());
                state.rows.insert(at, ListRow::from(incident));
            }
            RegistryEvent::IncidentUpdated {
                incident, index, ..
            } => {
                let Some(at) = locate(&state.rows, *index, incident.id()) else {
                    return;
                };
                state.rows[at] = ListRow::from(incident);
            }
            RegistryEvent::IncidentRemoved { incident, index } => {
                let Some(at) = locate(&state.rows, *index, incident.id()) else {
                    return;
                };
                state.rows.remove(at);
            }
        }
        state.revision += 1;
    }

    fn on_subscribed(&self, incidents: &[Incident]) {
        self.seed(incidents);
    }
}

#[cfg(test)]
mod tests {
    use super::IncidentListView;
    use crate::model::geo::Coordinate;
    use crate::registry::incident_registry::IncidentRegistry;
    use std::sync::Arc;

    #[test]
    fn rows_track_registry_order_and_titles() {
        let registry = IncidentRegistry::default();
        let view = Arc::new(IncidentListView::new());
        registry.subscribe(view.clone());

        let a = registry.add(Coordinate::new(1.0, 2.0).unwrap()).unwrap();
        let b = registry.add(Coordinate::new(3.0, 4.0).unwrap()).unwrap();
        let c = registry.add(Coordinate::new(5.0, 6.0).unwrap()).unwrap();

        registry.rename(b.id(), "Pothole").unwrap();
        registry.remove(a.id()).unwrap();

        let rows = view.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, b.id());
        assert_eq!(rows[0].title, "Pothole");
        assert_eq!(rows[0].subtitle, "Lat: 3.0000, Lon: 4.0000");
        assert_eq!(rows[1].id, c.id());
        assert_eq!(view.revision(), 6);
    }

    #[test]
    fn subscribing_seeds_rows_before_later_events() {
        let registry = IncidentRegistry::default();
        registry.add(Coordinate::new(1.0, 2.0).unwrap()).unwrap();

        let view = Arc::new(IncidentListView::new());
        registry.subscribe(view.clone());
        registry.add(Coordinate::new(3.0, 4.0).unwrap()).unwrap();

        let titles: Vec<_> = view.rows().into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Incidencia #1", "Incidencia #2"]);
    }

    #[test]
    fn seed_copies_existing_incidents() {
        let registry = IncidentRegistry::default();
        registry.add(Coordinate::new(1.0, 2.0).unwrap()).unwrap();

        let view = IncidentListView::new();
        view.seed(&registry.list());
        assert_eq!(view.len(), 1);
        assert_eq!(view.rows()[0].title, "Incidencia #1");
    }
}
