//! Domain model for map-anchored incidents.
//!
//! # Responsibility
//! - Define the records and coordinate types shared by registry and views.
//!
//! # Invariants
//! - Every incident is identified by a stable `IncidentId`.
//! - Coordinates are validated at construction boundaries, never downstream.

pub mod geo;
pub mod incident;
