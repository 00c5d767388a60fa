//! Presentation state for the incident map screen.
//!
//! # Responsibility
//! - Keep UI mode and derived display state out of the registry.
//! - Provide observers for the map surface and the list UI.
//!
//! # Invariants
//! - Views hold snapshots only; every mutation goes through the registry.

pub mod list;
pub mod markers;
pub mod screen;
