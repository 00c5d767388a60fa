//! Map screen controller.
//!
//! # Responsibility
//! - Hold the explicit interaction mode (browsing vs. placing a pin).
//! - Translate map taps and dialog results into registry operations.
//! - Wire the pin layer and list view to registry notifications.
//!
//! # Invariants
//! - One accepted tap in `PlacingPin` creates exactly one incident and
//!   returns to `Browsing`.
//! - Taps while `Browsing` never touch the registry.
//! - A rejected tap leaves the mode unchanged.

use crate::config::MapConfig;
use crate::model::geo::{Coordinate, MercatorPoint};
use crate::model::incident::{Incident, IncidentId};
use crate::registry::events::SubscriptionId;
use crate::registry::incident_registry::{IncidentRegistry, RegistryResult};
use crate::view::list::IncidentListView;
use crate::view::markers::MarkerLayer;
use chrono::NaiveDate;
use log::debug;
use std::sync::Arc;

/// Interaction mode of the map screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScreenMode {
    #[default]
    Browsing,
    /// "Add incident" was pressed; the next map tap drops a pin.
    PlacingPin,
}

impl ScreenMode {
    pub fn accepts_pin(self) -> bool {
        matches!(self, Self::PlacingPin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Browsing => "browsing",
            Self::PlacingPin => "placing_pin",
        }
    }
}

/// Result of delivering one tap to the screen.
#[derive(Debug, Clone, PartialEq)]
pub enum TapOutcome {
    /// Screen was browsing; nothing happened.
    Ignored,
    Placed(Incident),
}

/// Toolkit-agnostic state behind the incident map screen.
pub struct MapScreen {
    registry: Arc<IncidentRegistry>,
    markers: Arc<MarkerLayer>,
    list: Arc<IncidentListView>,
    subscriptions: Vec<SubscriptionId>,
    home: Coordinate,
    mode: ScreenMode,
}

impl MapScreen {
    /// Builds the screen; each collaborator is seeded by its subscription, so
    /// no incident is missed or shown twice.
    pub fn new(registry: Arc<IncidentRegistry>, config: &MapConfig) -> Self {
        let markers = Arc::new(MarkerLayer::new(
            config.pin_layer_name.clone(),
            config.marker_style,
        ));
        let list = Arc::new(IncidentListView::new());

        let subscriptions = vec![
            registry.subscribe(markers.clone()),
            registry.subscribe(list.clone()),
        ];

        Self {
            registry,
            markers,
            list,
            subscriptions,
            home: config.home,
            mode: ScreenMode::Browsing,
        }
    }

    pub fn registry(&self) -> &Arc<IncidentRegistry> {
        &self.registry
    }

    pub fn markers(&self) -> &MarkerLayer {
        &self.markers
    }

    pub fn list(&self) -> &IncidentListView {
        &self.list
    }

    pub fn mode(&self) -> ScreenMode {
        self.mode
    }

    /// Initial map center.
    pub fn home(&self) -> Coordinate {
        self.home
    }

    pub fn home_world(&self) -> MercatorPoint {
        self.home.to_mercator()
    }

    /// Handles the "add incident" button.
    pub fn begin_placing_pin(&mut self) {
        self.set_mode(ScreenMode::PlacingPin);
    }

    pub fn cancel_placing_pin(&mut self) {
        self.set_mode(ScreenMode::Browsing);
    }

    /// Handles a map tap given in degrees.
    pub fn handle_tap(&mut self, location: Coordinate) -> RegistryResult<TapOutcome> {
        if !self.mode.accepts_pin() {
            return Ok(TapOutcome::Ignored);
        }
        let incident = self.registry.add(location)?;
        self.set_mode(ScreenMode::Browsing);
        Ok(TapOutcome::Placed(incident))
    }

    /// Handles a map tap given as a Spherical Mercator world position.
    pub fn handle_world_tap(&mut self, point: MercatorPoint) -> RegistryResult<TapOutcome> {
        if !self.mode.accepts_pin() {
            return Ok(TapOutcome::Ignored);
        }
        let location = point.to_coordinate()?;
        self.handle_tap(location)
    }

    /// Applies the result of the rename prompt.
    ///
    /// `None` means the prompt was dismissed and is a no-op.
    pub fn submit_rename(
        &self,
        id: IncidentId,
        input: Option<&str>,
    ) -> RegistryResult<Option<Incident>> {
        match input {
            Some(title) => self.registry.rename(id, title).map(Some),
            None => Ok(None),
        }
    }

    pub fn remove(&self, id: IncidentId) -> RegistryResult<Incident> {
        self.registry.remove(id)
    }

    pub fn search(&self, name: &str, date: Option<NaiveDate>) -> Vec<Incident> {
        self.registry.filter(name, date)
    }

    /// Incident shown at 0-based list `position`.
    pub fn incident_at(&self, position: usize) -> Option<Incident> {
        self.registry.list().into_iter().nth(position)
    }

    fn set_mode(&mut self, mode: ScreenMode) {
        if self.mode != mode {
            debug!(
                "event=screen_mode module=view from={} to={}",
                self.mode.as_str(),
                mode.as_str()
            );
        }
        self.mode = mode;
    }
}

impl Drop for MapScreen {
    fn drop(&mut self) {
        for id in self.subscriptions.drain(..) {
            self.registry.unsubscribe(id);
        }
    }
}
