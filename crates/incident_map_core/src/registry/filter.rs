//! Title/date filtering for incident search.
//!
//! # Invariants
//! - Name matching is a case-insensitive substring test.
//! - A blank name matches every incident.
//! - Date matching compares the UTC calendar date of `created_at`.

use crate::model::incident::Incident;
use chrono::NaiveDate;

/// Search criteria for `IncidentRegistry::filter`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentFilter {
    needle: String,
    date: Option<NaiveDate>,
}

impl IncidentFilter {
    pub fn new(name: &str, date: Option<NaiveDate>) -> Self {
        Self {
            needle: name.trim().to_lowercase(),
            date,
        }
    }

    /// Filter that matches every incident.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn matches(&self, incident: &Incident) -> bool {
        if let Some(date) = self.date {
            if incident.created_on() != date {
                return false;
            }
        }
        self.needle.is_empty() || incident.title().to_lowercase().contains(&self.needle)
    }
}

#[cfg(test)]
mod tests {
    use super::IncidentFilter;
    use crate::model::geo::BUENOS_AIRES;
    use crate::model::incident::Incident;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn incident_on(day: u32) -> Incident {
        let at = Utc.with_ymd_and_hms(2025, 5, day, 8, 30, 0).unwrap();
        Incident::create(1, "Incidencia #1".to_string(), BUENOS_AIRES, at).unwrap()
    }

    #[test]
    fn name_match_ignores_case_and_surrounding_space() {
        let incident = incident_on(1);
        assert!(IncidentFilter::new("inciden", None).matches(&incident));
        assert!(IncidentFilter::new("  INCIDENCIA #1 ", None).matches(&incident));
        assert!(!IncidentFilter::new("foo", None).matches(&incident));
    }

    #[test]
    fn blank_name_matches_all() {
        let incident = incident_on(1);
        assert!(IncidentFilter::new("", None).matches(&incident));
        assert!(IncidentFilter::new("   ", None).matches(&incident));
        assert!(IncidentFilter::any().matches(&incident));
    }

    #[test]
    fn date_restricts_to_creation_day() {
        let incident = incident_on(2);
        let same_day = NaiveDate::from_ymd_opt(2025, 5, 2).unwrap();
        let other_day = NaiveDate::from_ymd_opt(2025, 5, 3).unwrap();

        assert!(IncidentFilter::new("", Some(same_day)).matches(&incident));
        assert!(!IncidentFilter::new("", Some(other_day)).matches(&incident));
        assert!(!IncidentFilter::new("inciden", None)
            .on_date(other_day)
            .matches(&incident));
    }
}
