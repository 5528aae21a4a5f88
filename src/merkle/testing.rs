//! Test doubles for the Merkle engine's external collaborators.
//!
//! Neither of these is SNARK-friendly or cryptographically sound; they
//! exist so the rest of the crate (and downstream integrators without a
//! real hash oracle yet) can exercise the engine deterministically.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::adapters::{BlobStore, BlobStoreError, HashOracle};
use crate::domain::FieldElement;

/// An `xxh64`-backed stand-in for the real algebraic hash oracle.
///
/// Domain-separates each arity so `hash1`, `hash2`, and `hash4` of the same
/// bit pattern never collide with one another.
#[derive(Debug, Default, Clone, Copy)]
pub struct TestHashOracle;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("test hash oracle never fails")]
pub struct TestHashOracleError;

fn mix(tag: u8, fields: &[FieldElement]) -> FieldElement {
    let mut bytes = vec![tag];
    for f in fields {
        bytes.extend_from_slice(&f.0.to_le_bytes());
    }
    FieldElement(xxhash_rust::xxh64::xxh64(&bytes, 0))
}

#[async_trait]
impl HashOracle for TestHashOracle {
    type Error = TestHashOracleError;

    async fn hash1(&self, a: FieldElement) -> Result<FieldElement, Self::Error> {
        Ok(mix(1, &[a]))
    }

    async fn hash2(&self, a: FieldElement, b: FieldElement) -> Result<FieldElement, Self::Error> {
        Ok(mix(2, &[a, b]))
    }

    async fn hash4(
        &self,
        a: FieldElement,
        b: FieldElement,
        c: FieldElement,
        d: FieldElement,
    ) -> Result<FieldElement, Self::Error> {
        Ok(mix(4, &[a, b, c, d]))
    }

    async fn hash2_batch(
        &self,
        pairs: &[(FieldElement, FieldElement)],
        concurrency: usize,
    ) -> Result<Vec<FieldElement>, Self::Error> {
        use tokio::sync::Semaphore;

        let semaphore = std::sync::Arc::new(Semaphore::new(concurrency.max(1)));
        let mut set = tokio::task::JoinSet::new();
        for (index, (a, b)) in pairs.iter().copied().enumerate() {
            let permit = semaphore.clone().acquire_owned().await.expect("semaphore not closed");
            set.spawn(async move {
                let _permit = permit;
                (index, mix(2, &[a, b]))
            });
        }

        let mut results = vec![FieldElement::ZERO; pairs.len()];
        while let Some(joined) = set.join_next().await {
            let (index, value) = joined.expect("hash2_batch task panicked");
            results[index] = value;
        }
        Ok(results)
    }
}

/// An in-process, in-memory [`BlobStore`] keyed by a content hash of the
/// bytes, for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, bytes: Vec<u8>, hinted_filename: &str) -> Result<String, BlobStoreError> {
        let content_id = format!("{:016x}-{}", xxhash_rust::xxh64::xxh64(&bytes, 0), hinted_filename);
        self.objects
            .lock()
            .map_err(|_| BlobStoreError::PutFailed { attempted_bytes: bytes.len(), reason: "lock poisoned".to_string() })?
            .insert(content_id.clone(), bytes);
        Ok(content_id)
    }

    async fn get(&self, content_id: &str) -> Result<Vec<u8>, BlobStoreError> {
        self.objects
            .lock()
            .map_err(|_| BlobStoreError::NotFound(content_id.to_string()))?
            .get(content_id)
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(content_id.to_string()))
    }
}
