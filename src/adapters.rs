//! External collaborator contracts (§1, §6): geometry provider, hash oracle,
//! blob store, clock. These are traits only — Shadow Atlas consumes them,
//! it does not implement a production geometry provider or hash oracle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::FieldElement;

/// Returns the current instant. All time arithmetic in the core goes through
/// this trait so tests can drive redistricting-gap logic deterministically.
pub trait Clock: Send + Sync {
    /// The current instant, UTC.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock [`Clock`] backed by `Utc::now()`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A [`Clock`] pinned to a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Errors a geometry provider adapter surfaces (§6). Shadow Atlas's core
/// never constructs these directly; they flow in from the adapter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryProviderError {
    /// The source is not currently available.
    #[error("geometry source not available")]
    NotAvailable,
    /// The fetch timed out.
    #[error("geometry fetch timed out")]
    Timeout,
    /// The payload didn't match the expected schema.
    #[error("geometry payload has the wrong schema")]
    WrongSchema,
    /// The HTTP layer returned a non-2xx status.
    #[error("geometry fetch returned http status {0}")]
    HttpStatus(u16),
    /// More features were returned than the caller expected.
    #[error("geometry payload has too many features: {0}")]
    TooManyFeatures(u32),
    /// Fewer features were returned than the caller expected.
    #[error("geometry payload has too few features: {0}")]
    TooFewFeatures(u32),
}

/// Geometry and fetch metadata returned by a geometry provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedBoundary {
    /// Raw geometry payload, in whatever `format` names.
    pub geometry: Vec<u8>,
    /// `Last-Modified`-equivalent header, if the source sent one.
    pub last_modified: Option<DateTime<Utc>>,
    /// `ETag`-equivalent header, if the source sent one.
    pub etag: Option<String>,
    /// Data format (e.g. "geojson", "shapefile").
    pub format: String,
}

/// Adapter contract for fetching boundary geometry (§6). Not implemented in
/// this crate: the specific point-in-polygon/GIS stack is a named Non-goal.
#[async_trait]
pub trait GeometryProvider: Send + Sync {
    /// Fetch the boundary geometry for a jurisdiction/kind from a source URL.
    async fn fetch_boundary(
        &self,
        jurisdiction: &str,
        kind: crate::domain::BoundaryKind,
        source_url: &str,
    ) -> Result<FetchedBoundary, GeometryProviderError>;
}

/// The SNARK-friendly algebraic permutation the Merkle engine hashes with.
///
/// Arity-1/2/4 invocations plus batch variants bounded by an explicit
/// concurrency limit (§6). The concrete parameterization (e.g. Poseidon2) is
/// an implementation choice bound to the downstream verifier contract and is
/// deliberately not fixed here (§9 Open Questions) — production callers
/// supply a real oracle; [`crate::merkle::TestHashOracle`] exists only for
/// tests and development.
#[async_trait]
pub trait HashOracle: Send + Sync {
    /// Error type surfaced by this oracle.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Arity-1 hash.
    async fn hash1(&self, a: FieldElement) -> Result<FieldElement, Self::Error>;

    /// Arity-2 hash.
    async fn hash2(&self, a: FieldElement, b: FieldElement) -> Result<FieldElement, Self::Error>;

    /// Arity-4 hash.
    async fn hash4(
        &self,
        a: FieldElement,
        b: FieldElement,
        c: FieldElement,
        d: FieldElement,
    ) -> Result<FieldElement, Self::Error>;

    /// Hash many independent arity-2 pairs, bounded by `concurrency`.
    async fn hash2_batch(
        &self,
        pairs: &[(FieldElement, FieldElement)],
        concurrency: usize,
    ) -> Result<Vec<FieldElement>, Self::Error>;
}

/// Errors a blob store adapter surfaces.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlobStoreError {
    /// The store rejected or failed the write, carrying the attempted size.
    #[error("blob store put of {attempted_bytes} bytes failed: {reason}")]
    PutFailed {
        /// Size of the buffer that failed to upload.
        attempted_bytes: usize,
        /// Human-readable reason.
        reason: String,
    },
    /// The requested content ID was not found.
    #[error("blob store has no object for content id `{0}`")]
    NotFound(String),
}

/// Adapter contract for content-addressed blob storage (§6), e.g. IPFS.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes`, returning a content identifier. `hinted_filename` is an
    /// advisory name some backends use for debugging/indexing.
    async fn put(&self, bytes: Vec<u8>, hinted_filename: &str) -> Result<String, BlobStoreError>;

    /// Fetch bytes by content identifier.
    async fn get(&self, content_id: &str) -> Result<Vec<u8>, BlobStoreError>;
}
