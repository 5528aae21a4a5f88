//! Tree construction and proof generation for the Merkle Commitment Engine
//! (§4.F "Tree build" and "Proof").

use std::collections::HashMap;

use crate::adapters::HashOracle;
use crate::domain::{FieldElement, MerkleLeafInput, MerkleProof, TreeConfiguration};

use super::leaf::hash_leaf;

/// Errors from building or querying a [`MerkleTree`].
#[derive(Debug, thiserror::Error)]
pub enum MerkleError<E: std::error::Error + Send + Sync + 'static> {
    /// More leaves were supplied than the configured depth can hold.
    #[error("{leaf_count} leaves exceed capacity {capacity} at depth {depth}")]
    CapacityExceeded { leaf_count: usize, capacity: u64, depth: u32 },
    /// The input contained the same address more than once.
    #[error("duplicate leaf ids: {0:?}")]
    DuplicateLeaves(Vec<String>),
    /// The hash oracle failed. Propagated unchanged, never swallowed.
    #[error(transparent)]
    HashOracle(E),
}

/// `generateProof` was asked for an address never inserted (§4.F "Proof").
/// Kept separate from [`MerkleError`] since proof generation never touches
/// the hash oracle and so carries no oracle-error type parameter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown address `{0}`")]
pub struct UnknownAddress(pub String);

fn padding_hash(padding_leaf: FieldElement) -> FieldElement {
    padding_leaf
}

/// A built Merkle tree: dense level vectors plus an address→index map, so
/// proof generation is O(depth) without reconstructing anything.
pub struct MerkleTree {
    config: TreeConfiguration,
    /// `levels[0]` is the padded leaf layer; `levels[depth]` has one element, the root.
    levels: Vec<Vec<FieldElement>>,
    index_of: HashMap<String, usize>,
}

impl MerkleTree {
    /// Build a tree from `inputs` using `oracle` (§4.F). Detects up to five
    /// duplicate ids for the diagnostic; rejects anything past capacity.
    pub async fn build<O: HashOracle>(
        inputs: &[MerkleLeafInput],
        config: TreeConfiguration,
        oracle: &O,
    ) -> Result<Self, MerkleError<O::Error>> {
        let capacity = config.depth.capacity();
        if inputs.len() as u64 > capacity {
            return Err(MerkleError::CapacityExceeded {
                leaf_count: inputs.len(),
                capacity,
                depth: config.depth.as_u32(),
            });
        }

        let mut seen = HashMap::with_capacity(inputs.len());
        let mut duplicates = Vec::new();
        for input in inputs {
            if seen.insert(input.id.clone(), ()).is_some() {
                if duplicates.len() < 5 {
                    duplicates.push(input.id.clone());
                }
            }
        }
        if !duplicates.is_empty() {
            return Err(MerkleError::DuplicateLeaves(duplicates));
        }

        let padding_leaf = oracle
            .hash1(FieldElement(xxhash_rust::xxh64::xxh64(b"PADDING", 0)))
            .await
            .map_err(MerkleError::HashOracle)?;
        let padding_leaf = padding_hash(padding_leaf);

        let mut leaves = Vec::with_capacity(capacity as usize);
        let mut index_of = HashMap::with_capacity(inputs.len());
        for (batch_start, batch) in inputs.chunks(config.batch_size).enumerate() {
            let mut batch_hashes = Vec::with_capacity(batch.len());
            for input in batch {
                batch_hashes.push(hash_leaf(oracle, input).await.map_err(MerkleError::HashOracle)?);
            }
            for (offset, hash) in batch_hashes.into_iter().enumerate() {
                let index = batch_start * config.batch_size + offset;
                index_of.insert(batch[offset].id.clone(), index);
                leaves.push(hash);
            }
        }
        leaves.resize(capacity as usize, padding_leaf);

        let mut levels = vec![leaves];
        for _ in 0..config.depth.as_u32() {
            let current = levels.last().expect("levels is never empty");
            let mut next = Vec::with_capacity(current.len() / 2);
            let pairs: Vec<(FieldElement, FieldElement)> =
                current.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect();
            let hashed = oracle
                .hash2_batch(&pairs, config.batch_size)
                .await
                .map_err(MerkleError::HashOracle)?;
            next.extend(hashed);
            levels.push(next);
        }

        Ok(Self { config, levels, index_of })
    }

    /// The tree's root, the sole element of the top level.
    pub fn root(&self) -> FieldElement {
        self.levels[self.config.depth.as_u32() as usize][0]
    }

    /// Number of real (non-padding) leaves inserted.
    pub fn address_count(&self) -> usize {
        self.index_of.len()
    }

    /// The tree's configuration.
    pub fn config(&self) -> TreeConfiguration {
        self.config
    }

    /// All inserted addresses with their leaf index, sorted by index.
    pub fn indexed_addresses(&self) -> Vec<(usize, String)> {
        let mut pairs: Vec<(usize, String)> =
            self.index_of.iter().map(|(id, &index)| (index, id.clone())).collect();
        pairs.sort_by_key(|(index, _)| *index);
        pairs
    }

    /// The level-0 (padded leaf) hash at `index`, without walking a proof.
    pub fn leaf_hash_at(&self, index: usize) -> FieldElement {
        self.levels[0][index]
    }

    /// Generate an O(depth) membership proof for `address`.
    pub fn generate_proof(&self, address: &str) -> Result<MerkleProof, UnknownAddress> {
        let index = *self
            .index_of
            .get(address)
            .ok_or_else(|| UnknownAddress(address.to_string()))?;

        let depth = self.config.depth.as_u32();
        let mut siblings = Vec::with_capacity(depth as usize);
        let mut path_indices = Vec::with_capacity(depth as usize);
        let mut cursor = index;

        for level in 0..depth as usize {
            let is_right = cursor % 2 == 1;
            let sibling_index = if is_right { cursor - 1 } else { cursor + 1 };
            siblings.push(self.levels[level][sibling_index]);
            path_indices.push(is_right);
            cursor /= 2;
        }

        Ok(MerkleProof {
            root: self.root(),
            leaf: self.levels[0][index],
            siblings,
            path_indices,
            depth,
        })
    }
}

/// Recompute the claimed leaf up through `proof.siblings` and compare to
/// `proof.root`. Used only for self-test; the downstream SNARK circuit is
/// the real verifier (§4.F).
pub async fn verify_proof<O: HashOracle>(oracle: &O, proof: &MerkleProof) -> Result<bool, O::Error> {
    let mut current = proof.leaf;
    for (sibling, is_right) in proof.siblings.iter().zip(proof.path_indices.iter()) {
        current = if *is_right {
            oracle.hash2(*sibling, current).await?
        } else {
            oracle.hash2(current, *sibling).await?
        };
    }
    Ok(current == proof.root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BoundaryKind, TreeDepth};
    use crate::merkle::testing::TestHashOracle;

    fn inputs(n: usize) -> Vec<MerkleLeafInput> {
        (0..n)
            .map(|i| MerkleLeafInput {
                id: format!("addr{i}"),
                boundary_kind: BoundaryKind::StateLower,
                geometry_hash: format!("geom{i}"),
                authority_level: 5,
                source: None,
            })
            .collect()
    }

    #[tokio::test]
    async fn proof_verifies_for_every_inserted_address_and_fails_for_others() {
        let oracle = TestHashOracle::default();
        let config = TreeConfiguration::new(Some(TreeDepth::D18), 8, None);
        let leaves = inputs(16);
        let tree = MerkleTree::build(&leaves, config, &oracle).await.unwrap();

        for leaf in &leaves {
            let proof = tree.generate_proof(&leaf.id).unwrap();
            assert!(verify_proof(&oracle, &proof).await.unwrap());
        }

        let proof_for_addr0 = tree.generate_proof("addr0").unwrap();
        let mut tampered = proof_for_addr0.clone();
        tampered.leaf = FieldElement(tampered.leaf.0 ^ 1);
        assert!(!verify_proof(&oracle, &tampered).await.unwrap());
    }

    #[tokio::test]
    async fn unknown_address_is_rejected() {
        let oracle = TestHashOracle::default();
        let config = TreeConfiguration::new(Some(TreeDepth::D18), 8, None);
        let tree = MerkleTree::build(&inputs(4), config, &oracle).await.unwrap();
        let result = tree.generate_proof("addr999");
        assert!(matches!(result, Err(UnknownAddress(_))));
    }

    #[tokio::test]
    async fn duplicate_ids_fail_before_hashing_is_observable() {
        let oracle = TestHashOracle::default();
        let config = TreeConfiguration::new(Some(TreeDepth::D18), 8, None);
        let mut leaves = inputs(3);
        leaves.push(leaves[0].clone());
        let result = MerkleTree::build(&leaves, config, &oracle).await;
        assert!(matches!(result, Err(MerkleError::DuplicateLeaves(_))));
    }

    #[tokio::test]
    async fn capacity_exceeded_is_rejected() {
        let oracle = TestHashOracle::default();
        let config = TreeConfiguration { depth: TreeDepth::D18, batch_size: 8 };
        let too_many = inputs((config.depth.capacity() + 1) as usize);
        let result = MerkleTree::build(&too_many, config, &oracle).await;
        assert!(matches!(result, Err(MerkleError::CapacityExceeded { .. })));
    }

    #[tokio::test]
    async fn fixed_input_order_reproduces_bit_identical_root() {
        // Spec scenario 5: 16 inputs, depth 18, batchSize 8.
        let oracle = TestHashOracle::default();
        let config = TreeConfiguration { depth: TreeDepth::D18, batch_size: 8 };
        let leaves = inputs(16);

        let tree_a = MerkleTree::build(&leaves, config, &oracle).await.unwrap();
        let tree_b = MerkleTree::build(&leaves, config, &oracle).await.unwrap();
        assert_eq!(tree_a.root(), tree_b.root());
    }
}
