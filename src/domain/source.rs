//! Source descriptors: who publishes a boundary and how.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of publisher for a boundary source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// The de jure legal authority for the boundary (e.g. a redistricting commission).
    Primary,
    /// A convenience re-publisher, not the legal authority.
    Aggregator,
    /// The specific aggregator produced by a national statistics office on an annual cycle.
    Tiger,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Primary => "primary",
            Self::Aggregator => "aggregator",
            Self::Tiger => "tiger",
        };
        write!(f, "{}", s)
    }
}

/// Descriptor for one source of boundary geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Category of publisher.
    pub source_type: SourceType,
    /// Human-readable provider name.
    pub provider_name: String,
    /// Jurisdiction this source claims ("CA", "*" for wildcard, etc).
    pub jurisdiction: String,
    /// URL to fetch the boundary from.
    pub url: String,
    /// Data format (e.g. "shapefile", "geojson").
    pub format: String,
    /// Whether the format is machine-readable without manual intervention.
    pub machine_readable: bool,
}

impl SourceDescriptor {
    /// Whether this source claims the given jurisdiction, including wildcard match.
    pub fn claims(&self, jurisdiction: &str) -> bool {
        self.jurisdiction == "*" || self.jurisdiction == jurisdiction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make(jurisdiction: &str) -> SourceDescriptor {
        SourceDescriptor {
            source_type: SourceType::Primary,
            provider_name: "Test Commission".to_string(),
            jurisdiction: jurisdiction.to_string(),
            url: "https://example.test/boundary".to_string(),
            format: "geojson".to_string(),
            machine_readable: true,
        }
    }

    #[test]
    fn wildcard_claims_everything() {
        let wildcard = make("*");
        assert!(wildcard.claims("CA"));
        assert!(wildcard.claims("NC"));
    }

    #[test]
    fn exact_match_only() {
        let ca = make("CA");
        assert!(ca.claims("CA"));
        assert!(!ca.claims("NC"));
    }
}
