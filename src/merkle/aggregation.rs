//! Global aggregation (§4.F "Global aggregation"): a second builder that
//! composes per-district roots into a country/region/continent tree using
//! the same padded-binary-tree algorithm as the district-level engine.
//!
//! A district root isn't a [`crate::domain::MerkleLeafInput`] — it's already
//! a [`FieldElement`] — so aggregation reuses the pairing/padding core
//! directly rather than going through leaf hashing.

use std::collections::HashMap;

use crate::adapters::HashOracle;
use crate::domain::{FieldElement, TreeConfiguration, TreeDepth};

/// Errors building an [`AggregationTree`].
#[derive(Debug, thiserror::Error)]
pub enum AggregationError<E: std::error::Error + Send + Sync + 'static> {
    /// More district roots were supplied than the configured depth can hold.
    #[error("{root_count} district roots exceed capacity {capacity} at depth {depth}")]
    CapacityExceeded { root_count: usize, capacity: u64, depth: u32 },
    /// The same district id was aggregated more than once.
    #[error("duplicate district ids in aggregation input: {0:?}")]
    DuplicateDistricts(Vec<String>),
    /// The hash oracle failed. Propagated unchanged, never swallowed.
    #[error(transparent)]
    HashOracle(E),
}

/// One district's committed root, ready to be folded into a region/country
/// tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictRoot {
    /// Stable identifier for the district (e.g. `"CA-12"`).
    pub district_id: String,
    /// The district-level Merkle root (from [`super::tree::MerkleTree::root`]).
    pub root: FieldElement,
}

/// A tree of district roots, one level up from the per-district trees
/// (§4.F "Global aggregation"). Built with the same padding/pairing
/// algorithm, just over [`FieldElement`] inputs instead of leaf inputs.
pub struct AggregationTree {
    config: TreeConfiguration,
    levels: Vec<Vec<FieldElement>>,
    index_of: HashMap<String, usize>,
}

impl AggregationTree {
    /// Fold `districts` into an aggregation tree at `config.depth`,
    /// padding with the oracle's hash of the literal string `"PADDING"`
    /// exactly as the district-level tree does.
    pub async fn build<O: HashOracle>(
        districts: &[DistrictRoot],
        config: TreeConfiguration,
        oracle: &O,
    ) -> Result<Self, AggregationError<O::Error>> {
        let capacity = config.depth.capacity();
        if districts.len() as u64 > capacity {
            return Err(AggregationError::CapacityExceeded {
                root_count: districts.len(),
                capacity,
                depth: config.depth.as_u32(),
            });
        }

        let mut seen = HashMap::with_capacity(districts.len());
        let mut duplicates = Vec::new();
        for d in districts {
            if seen.insert(d.district_id.clone(), ()).is_some() {
                if duplicates.len() < 5 {
                    duplicates.push(d.district_id.clone());
                }
            }
        }
        if !duplicates.is_empty() {
            return Err(AggregationError::DuplicateDistricts(duplicates));
        }

        let padding_leaf = oracle
            .hash1(FieldElement(xxhash_rust::xxh64::xxh64(b"PADDING", 0)))
            .await
            .map_err(AggregationError::HashOracle)?;

        let mut index_of = HashMap::with_capacity(districts.len());
        let mut leaves = Vec::with_capacity(capacity as usize);
        for (index, d) in districts.iter().enumerate() {
            index_of.insert(d.district_id.clone(), index);
            leaves.push(d.root);
        }
        leaves.resize(capacity as usize, padding_leaf);

        let mut levels = vec![leaves];
        for _ in 0..config.depth.as_u32() {
            let current = levels.last().expect("levels is never empty");
            let pairs: Vec<(FieldElement, FieldElement)> =
                current.chunks_exact(2).map(|pair| (pair[0], pair[1])).collect();
            let hashed = oracle
                .hash2_batch(&pairs, config.batch_size)
                .await
                .map_err(AggregationError::HashOracle)?;
            levels.push(hashed);
        }

        Ok(Self { config, levels, index_of })
    }

    /// The top (single-element) root of this aggregation level.
    pub fn root(&self) -> FieldElement {
        self.levels[self.config.depth.as_u32() as usize][0]
    }

    /// Number of real (non-padding) district roots folded in.
    pub fn district_count(&self) -> usize {
        self.index_of.len()
    }

    /// This aggregation level's configuration.
    pub fn config(&self) -> TreeConfiguration {
        self.config
    }
}

/// Pick the smallest depth that fits `count` children, falling back to the
/// largest supported depth if even that isn't enough. Aggregation levels
/// (region → country → continent) are usually far smaller than a district's
/// address set, so this keeps intermediate trees cheap.
pub fn smallest_fitting_depth(count: usize) -> TreeDepth {
    for depth in [TreeDepth::D18, TreeDepth::D20, TreeDepth::D22, TreeDepth::D24] {
        if (count as u64) <= depth.capacity() {
            return depth;
        }
    }
    TreeDepth::D24
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merkle::testing::TestHashOracle;

    fn roots(n: usize) -> Vec<DistrictRoot> {
        (0..n)
            .map(|i| DistrictRoot { district_id: format!("district{i}"), root: FieldElement(i as u64 + 1) })
            .collect()
    }

    #[tokio::test]
    async fn aggregation_is_deterministic_across_runs() {
        let oracle = TestHashOracle::default();
        let config = TreeConfiguration::new(Some(TreeDepth::D18), 8, None);
        let inputs = roots(10);

        let a = AggregationTree::build(&inputs, config, &oracle).await.unwrap();
        let b = AggregationTree::build(&inputs, config, &oracle).await.unwrap();
        assert_eq!(a.root(), b.root());
        assert_eq!(a.district_count(), 10);
    }

    #[tokio::test]
    async fn duplicate_district_ids_are_rejected() {
        let oracle = TestHashOracle::default();
        let config = TreeConfiguration::new(Some(TreeDepth::D18), 8, None);
        let mut inputs = roots(3);
        inputs.push(inputs[0].clone());
        let result = AggregationTree::build(&inputs, config, &oracle).await;
        assert!(matches!(result, Err(AggregationError::DuplicateDistricts(_))));
    }

    #[tokio::test]
    async fn capacity_exceeded_is_rejected() {
        let oracle = TestHashOracle::default();
        let config = TreeConfiguration { depth: TreeDepth::D18, batch_size: 8 };
        let too_many = roots((config.depth.capacity() + 1) as usize);
        let result = AggregationTree::build(&too_many, config, &oracle).await;
        assert!(matches!(result, Err(AggregationError::CapacityExceeded { .. })));
    }

    #[test]
    fn smallest_fitting_depth_picks_the_minimum() {
        assert_eq!(smallest_fitting_depth(1), TreeDepth::D18);
        assert_eq!(smallest_fitting_depth((1u64 << 18) as usize + 1), TreeDepth::D20);
    }
}
