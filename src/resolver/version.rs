//! Version Resolver (§4.D): given a boundary version chain and a query
//! date, picks the version legally effective on that date.

use crate::domain::{
    BoundaryVersionChain, CourtLevel, OrderType, VersionQuery, VersionResolution, VersionStatus,
    VersionedBoundary,
};

fn closest_future(chain: &BoundaryVersionChain, as_of: chrono::DateTime<chrono::Utc>) -> Option<&VersionedBoundary> {
    chain
        .versions
        .iter()
        .filter(|v| v.legal_effective_from > as_of)
        .min_by_key(|v| v.legal_effective_from)
}

fn most_recent_past(chain: &BoundaryVersionChain, as_of: chrono::DateTime<chrono::Utc>) -> Option<&VersionedBoundary> {
    chain
        .versions
        .iter()
        .filter(|v| v.legal_effective_from <= as_of)
        .max_by_key(|v| v.legal_effective_from)
}

fn court_precedence(v: &VersionedBoundary) -> (CourtLevel, u8, chrono::DateTime<chrono::Utc>) {
    match &v.court_order {
        Some(order) => (order.court_level, order.order_type.precedence_rank(), order.order_date),
        // No court order: lowest possible precedence, ordered only by the
        // version's own effective date so it never outranks a real order.
        None => (CourtLevel::StateLower, 0, v.legal_effective_from),
    }
}

fn has_strictly_newer_non_superseded(chain: &BoundaryVersionChain, chosen: &VersionedBoundary) -> bool {
    chain.versions.iter().any(|v| {
        v.version_id != chosen.version_id
            && v.legal_effective_from > chosen.legal_effective_from
            && v.status != VersionStatus::Superseded
    })
}

fn warnings_for(chain: &BoundaryVersionChain, chosen: &VersionedBoundary) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Some(order) = &chosen.court_order {
        if order.appealed {
            let status = order.appeal_status.as_deref().unwrap_or("pending");
            warnings.push(format!("version is under appeal ({status})"));
        }
    }
    if chosen.status == VersionStatus::Challenged {
        warnings.push("version is under active legal challenge".to_string());
    }
    if chosen.status == VersionStatus::Interim {
        warnings.push("version is interim, not yet final".to_string());
    }
    if has_strictly_newer_non_superseded(chain, chosen) {
        warnings.push("a strictly newer non-superseded version exists".to_string());
    }
    warnings
}

/// Resolve `query` against `chain` (§4.D algorithm, steps 1-6).
pub fn resolve_version(chain: &BoundaryVersionChain, query: &VersionQuery) -> VersionResolution {
    let mut effective: Vec<&VersionedBoundary> = chain
        .versions
        .iter()
        .filter(|v| v.covers(query.as_of_date))
        .collect();
    effective.sort_by_key(|v| v.sequence);

    if effective.is_empty() {
        return match closest_future(chain, query.as_of_date) {
            Some(future) => {
                let mut warnings = warnings_for(chain, future);
                warnings.push("no version was effective on the query date; using the next future version".to_string());
                VersionResolution { version: future.clone(), confidence: 0.3, warnings }
            }
            None => {
                let past = most_recent_past(chain, query.as_of_date)
                    .expect("a boundary version chain must have at least one version");
                let mut warnings = warnings_for(chain, past);
                warnings.push("no version was effective on the query date; using the most recent past version".to_string());
                VersionResolution { version: past.clone(), confidence: 0.2, warnings }
            }
        };
    }

    if let Some(election) = &query.election {
        let matching: Vec<&VersionedBoundary> = effective
            .iter()
            .copied()
            .filter(|v| v.applicable_elections.contains(election))
            .collect();
        if !matching.is_empty() {
            effective = matching;
        }
    }

    let chosen = if effective.len() == 1 {
        effective[0]
    } else {
        effective
            .iter()
            .copied()
            .max_by(|a, b| court_precedence(a).cmp(&court_precedence(b)))
            .expect("effective is non-empty")
    };

    let confidence = chosen.status.base_confidence();
    let warnings = warnings_for(chain, chosen);

    VersionResolution { version: chosen.clone(), confidence, warnings }
}
