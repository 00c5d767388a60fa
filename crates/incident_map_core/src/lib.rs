//! Core domain logic for the incident map.
//! This crate is the single source of truth for incident invariants.

pub mod config;
pub mod logging;
pub mod model;
pub mod registry;
pub mod view;

pub use config::{load_config, AppConfig, ConfigError, MapConfig, RegistryConfig, TitleNumbering};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::geo::{Coordinate, MercatorPoint, BUENOS_AIRES};
pub use model::incident::{Incident, IncidentId, IncidentValidationError};
pub use registry::events::{IncidentObserver, RegistryEvent, SubscriptionId};
pub use registry::filter::IncidentFilter;
pub use registry::incident_registry::{
    Clock, IncidentRegistry, RegistryError, RegistryResult, SystemClock,
};
pub use view::list::{IncidentListView, ListRow};
pub use view::markers::{Color, Marker, MarkerLayer, MarkerStyle};
pub use view::screen::{MapScreen, ScreenMode, TapOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
