//! Change notifications published by the incident registry.

use crate::model::incident::Incident;
use serde::Serialize;

/// Handle returned by `IncidentRegistry::subscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

/// One committed registry mutation.
///
/// `index` is the list position the change applies to: the new position for
/// added/updated incidents, the former position for removed ones.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RegistryEvent {
    IncidentAdded {
        incident: Incident,
        index: usize,
    },
    IncidentUpdated {
        incident: Incident,
        previous_title: String,
        index: usize,
    },
    IncidentRemoved {
        incident: Incident,
        index: usize,
    },
}

impl RegistryEvent {
    /// Incident snapshot carried by this event.
    pub fn incident(&self) -> &Incident {
        match self {
            Self::IncidentAdded { incident, .. }
            | Self::IncidentUpdated { incident, .. }
            | Self::IncidentRemoved { incident, .. } => incident,
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Self::IncidentAdded { index, .. }
            | Self::IncidentUpdated { index, .. }
            | Self::IncidentRemoved { index, .. } => *index,
        }
    }

    /// Stable event name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::IncidentAdded { .. } => "incident_added",
            Self::IncidentUpdated { .. } => "incident_updated",
            Self::IncidentRemoved { .. } => "incident_removed",
        }
    }
}

/// Receiver of registry change notifications.
///
/// Called synchronously after each committed mutation, outside the registry
/// lock. Implementations may read the registry; mutations issued from inside
/// a callback are delivered after the current event completes.
pub trait IncidentObserver: Send + Sync {
    fn on_registry_event(&self, event: &RegistryEvent);

    /// Receives the incident list as of subscription.
    ///
    /// Runs under the registry lock: events committed before this snapshot
    /// are never delivered to this observer, later ones always are. Must not
    /// call back into the registry.
    fn on_subscribed(&self, _incidents: &[Incident]) {}
}

impl<F> IncidentObserver for F
where
    F: Fn(&RegistryEvent) + Send + Sync,
{
    fn on_registry_event(&self, event: &RegistryEvent) {
        self(event)
    }
}
