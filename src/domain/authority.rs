//! Authority entries: the legal basis and source lists for one boundary kind.

use serde::{Deserialize, Serialize};

use super::SourceDescriptor;

/// Cadence at which a boundary kind's sources are expected to update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateTrigger {
    /// Updates on a fixed month each year.
    AnnualMonth,
    /// Updates in the year of a national census.
    CensusYear,
    /// Updates every N years on a redistricting cycle.
    RedistrictingCycleYears,
    /// Updates triggered by an external event (e.g. a court order).
    EventDriven,
    /// No automatic trigger; requires manual re-ingestion.
    Manual,
}

/// Expected lag bounds, in days, between a release and its ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LagBounds {
    /// Expected lag under normal operating conditions.
    pub normal_days: u32,
    /// Expected lag during an active redistricting cycle.
    pub redistricting_days: u32,
}

/// The full authority record for one boundary kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorityEntry {
    /// Name of the legal entity that holds authority for this kind.
    pub legal_entity: String,
    /// Citation or description of the legal basis.
    pub legal_basis: String,
    /// Ordered Primary sources, strongest preference first.
    pub primary_sources: Vec<SourceDescriptor>,
    /// Ordered Aggregator sources, strongest preference first.
    pub aggregator_sources: Vec<SourceDescriptor>,
    /// Cadence at which this kind's sources are expected to update.
    pub update_trigger: UpdateTrigger,
    /// Expected lag bounds.
    pub lag_bounds: LagBounds,
}

impl AuthorityEntry {
    /// Preference rank of a source within its own source-type list (0-based,
    /// lower is stronger). Returns `None` if the source is not present.
    pub fn preference_of(&self, source_type_list_is_primary: bool, url: &str) -> Option<usize> {
        let list = if source_type_list_is_primary {
            &self.primary_sources
        } else {
            &self.aggregator_sources
        };
        list.iter().position(|s| s.url == url)
    }

    /// All primary sources (any jurisdiction, including wildcards) that claim
    /// the given jurisdiction.
    pub fn primary_sources_for(&self, jurisdiction: &str) -> Vec<&SourceDescriptor> {
        self.primary_sources
            .iter()
            .filter(|s| s.claims(jurisdiction))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SourceType;

    fn src(jurisdiction: &str, url: &str) -> SourceDescriptor {
        SourceDescriptor {
            source_type: SourceType::Primary,
            provider_name: "p".to_string(),
            jurisdiction: jurisdiction.to_string(),
            url: url.to_string(),
            format: "geojson".to_string(),
            machine_readable: true,
        }
    }

    #[test]
    fn preference_rank_is_position() {
        let entry = AuthorityEntry {
            legal_entity: "Commission".to_string(),
            legal_basis: "Art. X".to_string(),
            primary_sources: vec![src("CA", "a"), src("CA", "b")],
            aggregator_sources: vec![],
            update_trigger: UpdateTrigger::RedistrictingCycleYears,
            lag_bounds: LagBounds { normal_days: 30, redistricting_days: 90 },
        };
        assert_eq!(entry.preference_of(true, "a"), Some(0));
        assert_eq!(entry.preference_of(true, "b"), Some(1));
        assert_eq!(entry.preference_of(true, "missing"), None);
    }
}
