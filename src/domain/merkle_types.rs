//! Data types for the Merkle Commitment Engine's public surface: field
//! elements, leaf inputs, proofs, and tree configuration.

use serde::{Deserialize, Serialize};

use super::BoundaryKind;

/// A field element in the hash oracle's native prime field.
///
/// Modeled as a newtype over `u64`; a production oracle backed by a wider
/// prime would widen this, but every hash call in this crate is expressed
/// purely in terms of this type so the representation stays swappable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FieldElement(pub u64);

impl FieldElement {
    /// The additive identity, used as the zero leaf/level sentinel.
    pub const ZERO: FieldElement = FieldElement(0);

    /// Render as a fixed-width hex string, for snapshot serialization.
    pub fn to_hex(self) -> String {
        format!("{:016x}", self.0)
    }
}

impl std::fmt::Display for FieldElement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Provenance attached to a Merkle leaf's authority field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceSource {
    /// URL the boundary/address was sourced from.
    pub url: String,
    /// Hex-encoded checksum of the sourced payload.
    pub checksum_hex: String,
    /// ISO-8601 timestamp of the source fetch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso8601_timestamp: Option<String>,
    /// Free-form tag identifying the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_tag: Option<String>,
}

impl ProvenanceSource {
    /// Whether this source carries enough data to contribute a provenance
    /// hash to the leaf (both `url` and `checksum_hex` non-empty, §4.F).
    pub fn is_committable(&self) -> bool {
        !self.url.is_empty() && !self.checksum_hex.is_empty()
    }
}

/// One address/boundary leaf destined for the Merkle tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleLeafInput {
    /// Stable identifier for this leaf (e.g. a normalized address string).
    pub id: String,
    /// Boundary kind this leaf belongs to.
    pub boundary_kind: BoundaryKind,
    /// Hex-encoded hash of the geometry that claims this leaf.
    pub geometry_hash: String,
    /// Authority level, `1..=5`.
    pub authority_level: u8,
    /// Provenance of the source this leaf was discovered from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ProvenanceSource>,
}

/// The only tree depths a deployed on-chain verifier accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TreeDepth {
    /// 2^18 capacity.
    D18 = 18,
    /// 2^20 capacity.
    D20 = 20,
    /// 2^22 capacity.
    D22 = 22,
    /// 2^24 capacity.
    D24 = 24,
}

impl TreeDepth {
    /// The raw depth as `u32`.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Leaf capacity, `2^depth`.
    pub fn capacity(self) -> u64 {
        1u64 << self.as_u32()
    }

    /// Parse a raw depth, rejecting any value outside `{18, 20, 22, 24}`.
    pub fn from_u32(depth: u32) -> Option<Self> {
        match depth {
            18 => Some(Self::D18),
            20 => Some(Self::D20),
            22 => Some(Self::D22),
            24 => Some(Self::D24),
            _ => None,
        }
    }

    /// The default depth for a given ISO-3166 alpha-3 country code, used
    /// when a caller doesn't pin one explicitly. Large countries get more
    /// headroom; this is a deployment heuristic, not a spec requirement
    /// beyond "optional country code that selects a default depth".
    pub fn default_for_country(country_code: &str) -> Self {
        match country_code {
            "USA" | "IND" | "CHN" | "BRA" | "IDN" => Self::D24,
            "GBR" | "DEU" | "FRA" | "JPN" | "MEX" => Self::D22,
            _ => Self::D20,
        }
    }
}

/// Configuration for one Merkle tree build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfiguration {
    /// Tree depth.
    pub depth: TreeDepth,
    /// Hashing parallelism hint; leaves/pairs are processed in batches of
    /// this size.
    pub batch_size: usize,
}

impl TreeConfiguration {
    /// Build a configuration, deriving the depth from a country code if
    /// none is given explicitly.
    pub fn new(depth: Option<TreeDepth>, batch_size: usize, country_code: Option<&str>) -> Self {
        let depth = depth.unwrap_or_else(|| {
            TreeDepth::default_for_country(country_code.unwrap_or(""))
        });
        Self { depth, batch_size }
    }
}

impl Default for TreeConfiguration {
    fn default() -> Self {
        Self {
            depth: TreeDepth::D20,
            batch_size: 64,
        }
    }
}

/// A Merkle membership proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// Root the proof is anchored to.
    pub root: FieldElement,
    /// The leaf value being proven.
    pub leaf: FieldElement,
    /// Sibling hashes from level 0 up to `depth - 1`.
    pub siblings: Vec<FieldElement>,
    /// Path bits: `false` means the target is the left child at that level.
    pub path_indices: Vec<bool>,
    /// Tree depth this proof was generated against.
    pub depth: u32,
}
