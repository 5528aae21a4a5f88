//! Authority Registry (§4.A): a process-wide, read-only table enumerating,
//! per boundary kind, the legally authoritative sources.
//!
//! Built once at startup and never mutated — the registry itself does no
//! I/O; it is a statically-built lookup table, not a dynamic dispatch
//! hierarchy (§9 "Dynamic dispatch over sources").

use std::collections::BTreeMap;

use crate::domain::{
    AuthorityEntry, BoundaryKind, RedistrictingCycleTable, SourceDescriptor,
};

/// Error returned by registry operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// `getAuthority` was called for a kind the registry has no entry for.
    ///
    /// The registry is built total over [`BoundaryKind::all`], so this is a
    /// programming error (§7 kind 1) — a bug in registry construction, not a
    /// normal runtime condition.
    #[error("no authority entry registered for boundary kind {0}")]
    UnknownKind(BoundaryKind),
}

/// Process-wide, read-only table of authority entries keyed by boundary kind.
#[derive(Debug, Clone)]
pub struct AuthorityRegistry {
    entries: BTreeMap<BoundaryKind, AuthorityEntry>,
    cycles: RedistrictingCycleTable,
}

impl AuthorityRegistry {
    /// Build a registry from an explicit set of entries and a redistricting
    /// cycle table. Entries must cover every `BoundaryKind`; entries for
    /// kinds not present in `BoundaryKind::all()` are ignored.
    ///
    /// Callers assemble their own jurisdiction-specific entry map and pass
    /// it here — the registry itself bakes in no country-specific data.
    pub fn new(
        entries: BTreeMap<BoundaryKind, AuthorityEntry>,
        cycles: RedistrictingCycleTable,
    ) -> Self {
        Self { entries, cycles }
    }

    /// Total over the `BoundaryKind` enum: fails loudly (`Err`, a
    /// programming error) rather than silently for an unregistered kind.
    pub fn get_authority(&self, kind: BoundaryKind) -> Result<&AuthorityEntry, RegistryError> {
        self.entries.get(&kind).ok_or(RegistryError::UnknownKind(kind))
    }

    /// Every primary source, across all boundary kinds, that claims the
    /// given jurisdiction (exact match or wildcard).
    pub fn get_primary_sources_for_state(&self, state: &str) -> Vec<(BoundaryKind, &SourceDescriptor)> {
        let mut out: Vec<(BoundaryKind, &SourceDescriptor)> = self
            .entries
            .iter()
            .flat_map(|(kind, entry)| {
                entry
                    .primary_sources_for(state)
                    .into_iter()
                    .map(move |s| (*kind, s))
            })
            .collect();
        // Deterministic ordering: by kind, then by source URL.
        out.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.url.cmp(&b.1.url)));
        out
    }

    /// Pure predicate over the fixed redistricting cycle set.
    pub fn is_redistricting_window(&self, year: i32) -> bool {
        self.cycles.is_redistricting_window(year)
    }

    /// The redistricting cycle table this registry was built with, shared
    /// with the Validity & Gap Engine so both components agree on cycle
    /// boundaries.
    pub fn cycles(&self) -> &RedistrictingCycleTable {
        &self.cycles
    }

    /// All boundary kinds this registry has an entry for.
    pub fn registered_kinds(&self) -> impl Iterator<Item = BoundaryKind> + '_ {
        self.entries.keys().copied()
    }
}
