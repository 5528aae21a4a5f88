//! Versioned boundaries, court-order provenance, and version chains.
//!
//! Cyclic `previousVersionId` links are modeled as string IDs into an arena
//! (the chain's `versions` vec), never as owning pointers (§9).

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Legal/judicial status of one boundary version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    /// Enacted by the ordinary legislative/commission process.
    Enacted,
    /// An interim map pending further proceedings.
    Interim,
    /// A court-ordered remedial map.
    Remedial,
    /// Replaced by a later version.
    Superseded,
    /// Blocked by an injunction.
    Enjoined,
    /// Subject to an active legal challenge but not yet blocked.
    Challenged,
}

impl VersionStatus {
    /// Confidence contributed by status alone, per §4.D step 4.
    pub fn base_confidence(self) -> f64 {
        match self {
            Self::Enacted => 1.0,
            Self::Remedial => 0.9,
            Self::Interim => 0.6,
            Self::Challenged => 0.4,
            Self::Superseded | Self::Enjoined => 0.0,
        }
    }
}

/// Level of court that issued an order affecting a boundary version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtLevel {
    /// State trial/lower court.
    StateLower,
    /// State supreme court.
    StateSupreme,
    /// Federal district court.
    FederalDistrict,
    /// Federal circuit court of appeals.
    FederalCircuit,
    /// Federal supreme court.
    FederalSupreme,
}

/// Kind of order a court issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// A mandate requiring a new map.
    Mandate,
    /// A court-drawn remedial map.
    Remedial,
    /// An interim map pending final resolution.
    Interim,
    /// An injunction blocking use of a map.
    Injunction,
}

impl OrderType {
    /// Precedence rank used for tie-breaking within the same court level,
    /// per §4.D step 5 (`mandate > remedial > interim > injunction`).
    pub fn precedence_rank(self) -> u8 {
        match self {
            Self::Mandate => 3,
            Self::Remedial => 2,
            Self::Interim => 1,
            Self::Injunction => 0,
        }
    }
}

/// Provenance of a court order bearing on a boundary version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourtOrderProvenance {
    /// Level of the issuing court.
    pub court_level: CourtLevel,
    /// Kind of order issued.
    pub order_type: OrderType,
    /// Date the order was issued.
    pub order_date: DateTime<Utc>,
    /// Date the order takes legal effect.
    pub effective_date: DateTime<Utc>,
    /// Date the order expires, if bounded.
    pub expiration_date: Option<DateTime<Utc>>,
    /// Elections this order applies to.
    pub applicable_elections: HashSet<String>,
    /// Whether the order has been appealed.
    pub appealed: bool,
    /// Status of that appeal, if any.
    pub appeal_status: Option<String>,
}

/// One legally-effective version of a boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionedBoundary {
    /// Unique identifier of this version.
    pub version_id: String,
    /// Monotonic sequence number within the chain.
    pub sequence: u32,
    /// Identifier of the version this one supersedes, if any.
    pub previous_version_id: Option<String>,
    /// Legal/judicial status.
    pub status: VersionStatus,
    /// Court order that produced or governs this version, if any.
    pub court_order: Option<CourtOrderProvenance>,
    /// Start of legal effect, inclusive.
    pub legal_effective_from: DateTime<Utc>,
    /// End of legal effect, exclusive. `None` means still in effect.
    pub legal_effective_until: Option<DateTime<Utc>>,
    /// Elections this version applies to.
    pub applicable_elections: HashSet<String>,
    /// Identifier of the map source used to build this version.
    pub map_source: String,
    /// Hash of the version's geometry.
    pub geometry_hash: String,
    /// Whether this is the chain's current version as of last resolution.
    pub is_current: bool,
}

impl VersionedBoundary {
    /// Whether `as_of` falls within this version's effective window.
    pub fn covers(&self, as_of: DateTime<Utc>) -> bool {
        as_of >= self.legal_effective_from
            && self.legal_effective_until.map_or(true, |until| as_of < until)
    }

    /// Whether this version is under active appeal or legal challenge.
    pub fn is_contested(&self) -> bool {
        self.status == VersionStatus::Challenged
            || self.court_order.as_ref().is_some_and(|o| o.appealed)
    }
}

/// The ordered sequence of legally-effective versions of a single boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundaryVersionChain {
    /// Identifier of the boundary (stable across versions).
    pub boundary_id: String,
    /// Boundary kind/layer type.
    pub layer_type: crate::domain::BoundaryKind,
    /// FIPS code of the owning state.
    pub state_fips: String,
    /// Census year this chain's versions were drawn under.
    pub census_year: i32,
    /// All known versions, in arbitrary order (the arena); order by
    /// `legal_effective_from` is computed on demand, not stored.
    pub versions: Vec<VersionedBoundary>,
    /// Identifier of the version currently marked current.
    pub current_version_id: Option<String>,
    /// Whether any version in this chain has active litigation.
    pub has_active_litigation: bool,
}

impl BoundaryVersionChain {
    /// Versions ordered by effective-from date ascending, for deterministic iteration.
    pub fn versions_by_effective_date(&self) -> Vec<&VersionedBoundary> {
        let mut v: Vec<&VersionedBoundary> = self.versions.iter().collect();
        v.sort_by_key(|version| (version.legal_effective_from, version.sequence));
        v
    }
}

/// A query against a [`BoundaryVersionChain`].
#[derive(Debug, Clone)]
pub struct VersionQuery {
    /// Boundary identifier being queried.
    pub boundary_id: String,
    /// Layer/kind of the boundary.
    pub layer_type: crate::domain::BoundaryKind,
    /// FIPS code of the owning state.
    pub state_fips: String,
    /// Instant to resolve the chain as of.
    pub as_of_date: DateTime<Utc>,
    /// Restrict to versions applicable to this election, if given.
    pub election: Option<String>,
    /// Whether to include the full history in the resolution's diagnostics.
    pub include_history: bool,
}

/// Result of resolving a [`VersionQuery`] against a chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionResolution {
    /// The version chosen as legally effective.
    pub version: VersionedBoundary,
    /// Confidence in the resolution, `[0, 1]`.
    pub confidence: f64,
    /// Warnings the caller should surface (appeal, challenge, interim status,
    /// or a strictly newer non-superseded version existing).
    pub warnings: Vec<String>,
}
