//! Incident domain model.
//!
//! # Responsibility
//! - Define the record shared by the map surface and the list view.
//! - Own title and coordinate validation rules.
//!
//! # Invariants
//! - `id` is stable and never reused for another incident.
//! - `title` is never empty or whitespace-only.
//! - `location` is a valid coordinate and never changes after creation.

use crate::model::geo::Coordinate;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier for every incident.
pub type IncidentId = Uuid;

/// Title prefix used when no configuration overrides it.
pub const DEFAULT_TITLE_PREFIX: &str = "Incidencia";

/// Validation failures for incident fields and coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IncidentValidationError {
    NonFiniteCoordinate { latitude: f64, longitude: f64 },
    LatitudeOutOfRange(f64),
    LongitudeOutOfRange(f64),
    BlankTitle,
}

impl Display for IncidentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFiniteCoordinate {
                latitude,
                longitude,
            } => write!(
                f,
                "coordinate must be finite, got lat={latitude} lon={longitude}"
            ),
            Self::LatitudeOutOfRange(value) => {
                write!(f, "latitude {value} is outside [-90, 90]")
            }
            Self::LongitudeOutOfRange(value) => {
                write!(f, "longitude {value} is outside [-180, 180]")
            }
            Self::BlankTitle => write!(f, "title cannot be empty or whitespace"),
        }
    }
}

impl Error for IncidentValidationError {}

/// A user-reported point of interest pinned on the map.
///
/// Instances handed out by the registry are snapshots: mutating a clone never
/// affects registry state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Incident {
    id: IncidentId,
    sequence: u64,
    title: String,
    location: Coordinate,
    created_at: DateTime<Utc>,
}

impl Incident {
    /// Builds a new incident with a fresh id.
    pub(crate) fn create(
        sequence: u64,
        title: String,
        location: Coordinate,
        created_at: DateTime<Utc>,
    ) -> Result<Self, IncidentValidationError> {
        location.validate()?;
        Ok(Self {
            id: Uuid::new_v4(),
            sequence,
            title,
            location,
            created_at,
        })
    }

    pub fn id(&self) -> IncidentId {
        self.id
    }

    /// 1-based creation number assigned at insertion.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn location(&self) -> Coordinate {
        self.location
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// UTC calendar date of creation, used by date filtering.
    pub fn created_on(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// Replaces the title and returns the previous one.
    pub(crate) fn set_title(&mut self, title: String) -> String {
        std::mem::replace(&mut self.title, title)
    }
}

/// Formats the default title for the `n`-th incident, e.g. `Incidencia #3`.
pub fn default_title(prefix: &str, n: u64) -> String {
    format!("{prefix} #{n}")
}

/// Normalizes a user-provided title.
///
/// Returns the trimmed title, or `BlankTitle` when nothing remains.
pub fn normalize_title(input: &str) -> Result<String, IncidentValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(IncidentValidationError::BlankTitle);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::{default_title, normalize_title, Incident, IncidentValidationError};
    use crate::model::geo::Coordinate;
    use chrono::{TimeZone, Utc};

    #[test]
    fn default_title_uses_prefix_and_number() {
        assert_eq!(default_title("Incidencia", 1), "Incidencia #1");
        assert_eq!(default_title("Report", 12), "Report #12");
    }

    #[test]
    fn normalize_title_trims_and_rejects_blank() {
        assert_eq!(normalize_title("  Water leak ").unwrap(), "Water leak");
        assert_eq!(
            normalize_title("").unwrap_err(),
            IncidentValidationError::BlankTitle
        );
        assert_eq!(
            normalize_title(" \t\n").unwrap_err(),
            IncidentValidationError::BlankTitle
        );
    }

    #[test]
    fn create_rejects_invalid_location() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let bad = Coordinate {
            latitude: 91.0,
            longitude: 0.0,
        };
        let err = Incident::create(1, default_title("Incidencia", 1), bad, at).unwrap_err();
        assert_eq!(err, IncidentValidationError::LatitudeOutOfRange(91.0));
    }

    #[test]
    fn create_assigns_fresh_ids() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 23, 59, 0).unwrap();
        let here = Coordinate::new(-34.6037, -58.3816).unwrap();
        let first = Incident::create(1, default_title("Incidencia", 1), here, at).unwrap();
        let second = Incident::create(2, default_title("Incidencia", 2), here, at).unwrap();

        assert_eq!(first.title(), "Incidencia #1");
        assert_eq!(second.title(), "Incidencia #2");
        assert!(!first.id().is_nil());
        assert_ne!(first.id(), second.id());
        assert_eq!(first.created_on().to_string(), "2025-03-01");
    }
}
