//! Map pin layer kept in sync with the registry.
//!
//! # Responsibility
//! - Hold one marker per incident at its Spherical Mercator position.
//! - Track a revision counter the map surface uses to trigger redraws.
//!
//! # Invariants
//! - Markers are added/removed only through registry events (or `seed`).
//! - Title edits never touch markers; pin positions are immutable.

use crate::model::geo::MercatorPoint;
use crate::model::incident::{Incident, IncidentId};
use crate::registry::events::{IncidentObserver, RegistryEvent};
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DEFAULT_PIN_LAYER_NAME: &str = "Incidencias";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    u8::MAX
}

impl Color {
    pub const RED: Self = Self::rgb(255, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: u8::MAX }
    }
}

/// Symbol style applied to every pin in the layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarkerStyle {
    pub symbol_scale: f64,
    pub fill: Color,
    pub outline: Color,
    pub outline_width: f64,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            symbol_scale: 0.8,
            fill: Color::RED,
            outline: Color::WHITE,
            outline_width: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub incident_id: IncidentId,
    pub position: MercatorPoint,
    pub style: MarkerStyle,
}

#[derive(Default)]
struct LayerState {
    markers: Vec<Marker>,
    revision: u64,
}

/// In-memory pin layer driven by registry events.
pub struct MarkerLayer {
    name: String,
    style: MarkerStyle,
    state: Mutex<LayerState>,
}

impl MarkerLayer {
    pub fn new(name: impl Into<String>, style: MarkerStyle) -> Self {
        Self {
            name: name.into(),
            style,
            state: Mutex::new(LayerState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn style(&self) -> MarkerStyle {
        self.style
    }

    /// Replaces all markers with pins for `incidents`.
    pub fn seed(&self, incidents: &[Incident]) {
        let mut state = self.lock();
        state.markers = incidents.iter().map(|i| self.marker_for(i)).collect();
        state.revision += 1;
    }

    pub fn markers(&self) -> Vec<Marker> {
        self.lock().markers.clone()
    }

    pub fn find(&self, id: IncidentId) -> Option<Marker> {
        self.lock()
            .markers
            .iter()
            .find(|m| m.incident_id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().markers.is_empty()
    }

    /// Bumped on every visible change; a surface redraws when it moves.
    pub fn revision(&self) -> u64 {
        self.lock().revision
    }

    fn marker_for(&self, incident: &Incident) -> Marker {
        Marker {
            incident_id: incident.id(),
            position: incident.location().to_mercator(),
            style: self.style,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LayerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl IncidentObserver for MarkerLayer {
    fn on_registry_event(&self, event: &RegistryEvent) {
        match event {
            RegistryEvent::IncidentAdded { incident, .. } => {
                let marker = self.marker_for(incident);
                let mut state = self.lock();
                state.markers.push(marker);
                state.revision += 1;
            }
            RegistryEvent::IncidentRemoved { incident, .. } => {
                let mut state = self.lock();
                let before = state.markers.len();
                state.markers.retain(|m| m.incident_id != incident.id());
                if state.markers.len() != before {
                    state.revision += 1;
                }
            }
            RegistryEvent::IncidentUpdated { .. } => {}
        }
    }

    fn on_subscribed(&self, incidents: &[Incident]) {
        self.seed(incidents);
    }
}

#[cfg(test)]
mod tests {
    use super::{Color, MarkerLayer, MarkerStyle};
    use crate::model::geo::BUENOS_AIRES;
    use crate::registry::incident_registry::IncidentRegistry;
    use std::sync::Arc;

    #[test]
    fn default_style_is_red_pin_with_white_outline() {
        let style = MarkerStyle::default();
        assert_eq!(style.fill, Color::RED);
        assert_eq!(style.outline, Color::WHITE);
        assert_eq!(style.symbol_scale, 0.8);
        assert_eq!(style.outline_width, 2.0);
    }

    #[test]
    fn follows_add_and_remove_but_not_rename() {
        let registry = IncidentRegistry::default();
        let layer = Arc::new(MarkerLayer::new("Incidencias", MarkerStyle::default()));
        registry.subscribe(layer.clone());

        let incident = registry.add(BUENOS_AIRES).unwrap();
        assert_eq!(layer.len(), 1);
        assert_eq!(layer.revision(), 2);
        let marker = layer.find(incident.id()).unwrap();
        assert_eq!(marker.position, BUENOS_AIRES.to_mercator());

        registry.rename(incident.id(), "Water leak").unwrap();
        assert_eq!(layer.revision(), 2);

        registry.remove(incident.id()).unwrap();
        assert!(layer.is_empty());
        assert_eq!(layer.revision(), 3);
    }

    #[test]
    fn alpha_defaults_to_opaque_when_omitted() {
        let color: Color = serde_json::from_str(r#"{"r": 1, "g": 2, "b": 3}"#).unwrap();
        assert_eq!(color, Color::rgb(1, 2, 3));
    }
}
