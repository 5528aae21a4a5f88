//! Merkle Commitment Engine (§4.F): leaf hashing, fixed-depth padded tree
//! construction, O(depth) membership proofs, IPFS-style snapshot export,
//! and national/regional aggregation over district roots.

pub mod aggregation;
pub mod leaf;
pub mod snapshot;
pub mod testing;
pub mod tree;

pub use aggregation::{AggregationError, AggregationTree, DistrictRoot, smallest_fitting_depth};
pub use leaf::hash_leaf;
pub use snapshot::{MerkleSnapshot, SnapshotLeaf, SnapshotMetadata, SNAPSHOT_SCHEMA_VERSION};
pub use testing::{InMemoryBlobStore, TestHashOracle, TestHashOracleError};
pub use tree::{verify_proof, MerkleError, MerkleTree, UnknownAddress};
