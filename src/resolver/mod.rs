//! Conflict Resolver and Version Resolver (§4.D).

pub mod conflict;
pub mod version;

pub use conflict::{resolve_conflict, BoundaryCandidate, ConflictResolution};
pub use version::resolve_version;

/// Error surfaced by resolver operations.
///
/// The resolvers themselves are pure and total given non-empty input;
/// [`conflict::resolve_conflict`] asserts on empty input rather than
/// returning a `Result` since an empty candidate set is a caller bug, not a
/// runtime condition a resolver can recover from (§7 kind 1).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolverError {
    /// A version chain had no versions at all.
    #[error("boundary version chain `{0}` has no versions")]
    EmptyChain(String),
}
