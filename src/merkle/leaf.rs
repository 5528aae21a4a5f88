//! Leaf hashing for the Merkle Commitment Engine (§4.F).

use crate::adapters::HashOracle;
use crate::domain::{FieldElement, MerkleLeafInput};

/// Map `input` to a single leaf field element via the four-step algorithm
/// (§4.F "Leaf hash"). Leaves with no provenance hash bit-identically to
/// leaves with the same `(id, kind, geometry, authority)` regardless of the
/// optional field, since `authorityField` degrades to the bare authority
/// level when `source` is absent or incomplete.
pub async fn hash_leaf<O: HashOracle>(oracle: &O, input: &MerkleLeafInput) -> Result<FieldElement, O::Error> {
    let type_hash = oracle.hash1(string_field(&input.boundary_kind.to_string())).await?;
    let id_hash = oracle.hash1(string_field(&input.id)).await?;
    let geometry_field = string_field(&input.geometry_hash);

    let authority_field = match &input.source {
        Some(source) if source.is_committable() => {
            let timestamp = source.iso8601_timestamp.as_deref().unwrap_or("");
            let provenance_string = format!("{}|{}|{}", source.url, source.checksum_hex, timestamp);
            let provenance_hash = oracle.hash1(string_field(&provenance_string)).await?;
            oracle
                .hash2(FieldElement(input.authority_level as u64), provenance_hash)
                .await?
        }
        _ => FieldElement(input.authority_level as u64),
    };

    oracle.hash4(type_hash, id_hash, geometry_field, authority_field).await
}

/// Fold an arbitrary string into a [`FieldElement`] the oracle can consume.
///
/// This is a pre-hash domain-encoding step, not the algebraic hash itself:
/// the oracle's `hash1` is what actually produces a SNARK-friendly digest.
/// `xxh64` is used only to compress a variable-length string into the
/// oracle's fixed-width input.
fn string_field(s: &str) -> FieldElement {
    FieldElement(xxhash_rust::xxh64::xxh64(s.as_bytes(), 0))
}
