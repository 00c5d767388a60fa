//! Incident registry: storage, search and change notification.
//!
//! # Responsibility
//! - Keep the ordered incident list and its map anchors consistent.
//! - Publish committed mutations to map and list collaborators.
//!
//! # Invariants
//! - The registry is the only mutator of incident records.
//! - List order is insertion order; edits never reorder.

pub mod events;
pub mod filter;
pub mod incident_registry;
