//! Tessellation proof records: the four-axiom check that a set of
//! sub-boundaries exactly covers a super-boundary without overlap.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of each of the four tessellation axioms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AxiomResults {
    /// No two districts overlap.
    pub exclusivity: bool,
    /// Districts exhaustively cover the super-boundary.
    pub exhaustivity: bool,
    /// Every district lies within the super-boundary.
    pub containment: bool,
    /// The district count matches the expected count.
    pub cardinality: bool,
}

impl AxiomResults {
    /// Whether every axiom passed.
    pub fn all_passed(&self) -> bool {
        self.exclusivity && self.exhaustivity && self.containment && self.cardinality
    }

    /// Name of the first failed axiom, if any, in exclusivity/exhaustivity/
    /// containment/cardinality order.
    pub fn first_failure(&self) -> Option<&'static str> {
        if !self.exclusivity {
            Some("exclusivity")
        } else if !self.exhaustivity {
            Some("exhaustivity")
        } else if !self.containment {
            Some("containment")
        } else if !self.cardinality {
            Some("cardinality")
        } else {
            None
        }
    }
}

/// Area/coverage diagnostics computed while validating a tessellation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TessellationDiagnostics {
    /// Number of districts found.
    pub district_count: u32,
    /// Number of districts expected.
    pub expected_count: u32,
    /// Total area counted more than once across districts.
    pub total_overlap_area: f64,
    /// Area of the super-boundary not covered by any district.
    pub uncovered_area: f64,
    /// Area of districts lying outside the super-boundary.
    pub outside_boundary_area: f64,
    /// Area of the municipal/super-boundary itself.
    pub municipal_area: f64,
    /// Area of the union of all districts.
    pub district_union_area: f64,
    /// `district_union_area / municipal_area`, clamped to `[0, 1]`.
    pub coverage_ratio: f64,
}

/// A completed (or failed) tessellation validation, stored append-only
/// alongside discovery provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TessellationProofRecord {
    /// FIPS code of the jurisdiction this tessellation validates. Also the
    /// shard key under which the record is persisted.
    pub fips: String,
    /// Whether the tessellation validated successfully.
    pub validated: bool,
    /// When the validation ran.
    pub validated_at: DateTime<Utc>,
    /// sha-256 hex digest of the district geometry that was validated.
    pub geometry_hash: String,
    /// Per-axiom pass/fail.
    pub axiom_results: AxiomResults,
    /// Area/coverage diagnostics.
    pub diagnostics: TessellationDiagnostics,
    /// Name of the first axiom that failed, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_axiom: Option<String>,
    /// Human-readable failure explanation, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// District identifiers implicated in a failure.
    #[serde(default)]
    pub problematic_districts: Vec<String>,
    /// Version string of the validator that produced this record.
    pub validator_version: String,
}

impl TessellationProofRecord {
    /// Whether a cached validation still applies to a re-downloaded geometry,
    /// by comparing against its freshly computed sha-256 hash.
    pub fn is_validation_current(&self, recomputed_geometry_hash: &str) -> bool {
        self.validated && self.geometry_hash == recomputed_geometry_hash
    }
}
