//! Conflict Resolver (§4.D): given multiple candidate boundary records for
//! the same boundary, picks the single winner by authority > preference >
//! freshness.

/// One candidate boundary record competing to resolve a single boundary ID.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryCandidate {
    /// Opaque identifier for this candidate (e.g. its source URL).
    pub candidate_id: String,
    /// Authority level, higher is stronger.
    pub authority: u8,
    /// Preference rank within the authority level; lower is stronger.
    pub preference: u32,
    /// Freshness confidence at the query instant, `[0, 1]`.
    pub freshness: f64,
}

impl BoundaryCandidate {
    /// `authority*1000 + (100 - preference)*100 + freshness*10` (§4.D).
    pub fn score(&self) -> f64 {
        let authority = self.authority as f64 * 1000.0;
        let preference = (100.0 - self.preference as f64) * 100.0;
        let freshness = self.freshness * 10.0;
        authority + preference + freshness
    }
}

/// Result of resolving a set of [`BoundaryCandidate`]s.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictResolution {
    /// The winning candidate.
    pub winner: BoundaryCandidate,
    /// Confidence in the resolution, `[0, 1]`.
    pub confidence: f64,
    /// Human-readable reasoning comparing winner to runner-up.
    pub reasoning: String,
}

fn age_band(freshness: f64) -> &'static str {
    if freshness >= 0.9 {
        "very fresh"
    } else if freshness >= 0.7 {
        "fresh"
    } else if freshness >= 0.4 {
        "aging"
    } else {
        "stale"
    }
}

fn reasoning_for(winner: &BoundaryCandidate, runner_up: &BoundaryCandidate) -> String {
    let mut reasons = Vec::new();
    if winner.authority > runner_up.authority {
        reasons.push("higher authority".to_string());
    } else if winner.authority == runner_up.authority {
        if winner.preference < runner_up.preference {
            reasons.push("same authority, higher preference".to_string());
        } else if winner.preference == runner_up.preference {
            reasons.push("same authority and preference, fresher data".to_string());
        }
    }
    reasons.push(format!("winner data is {}", age_band(winner.freshness)));
    reasons.join("; ")
}

/// Resolve the winning candidate among a set of competing boundary records
/// for the same boundary ID (§4.D).
///
/// Panics if `candidates` is empty: callers must not invoke the resolver
/// with nothing to resolve.
pub fn resolve_conflict(candidates: &[BoundaryCandidate]) -> ConflictResolution {
    assert!(!candidates.is_empty(), "resolve_conflict requires at least one candidate");

    if candidates.len() == 1 {
        return ConflictResolution {
            winner: candidates[0].clone(),
            confidence: 1.0,
            reasoning: "only candidate available".to_string(),
        };
    }

    let mut ranked: Vec<&BoundaryCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| {
        b.score()
            .partial_cmp(&a.score())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.candidate_id.cmp(&b.candidate_id))
    });

    let winner = ranked[0];
    let runner_up = ranked[1];

    let gap = winner.score() - runner_up.score();
    let confidence = 0.7 * (gap / 1000.0).clamp(0.0, 1.0) + 0.3 * winner.freshness;

    ConflictResolution {
        winner: winner.clone(),
        confidence,
        reasoning: reasoning_for(winner, runner_up),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_candidate_has_full_confidence() {
        let candidates = vec![BoundaryCandidate {
            candidate_id: "a".to_string(),
            authority: 5,
            preference: 0,
            freshness: 0.5,
        }];
        let resolution = resolve_conflict(&candidates);
        assert_eq!(resolution.confidence, 1.0);
    }

    #[test]
    fn conflict_resolution_under_gap_commission_wins() {
        // Spec §8 scenario 3.
        let tiger = BoundaryCandidate {
            candidate_id: "tiger".to_string(),
            authority: 5,
            preference: 3,
            freshness: 0.3,
        };
        let commission = BoundaryCandidate {
            candidate_id: "state-redistricting-commission".to_string(),
            authority: 5,
            preference: 1,
            freshness: 1.0,
        };
        let resolution = resolve_conflict(&[tiger, commission]);
        assert_eq!(resolution.winner.candidate_id, "state-redistricting-commission");
        assert!(resolution.reasoning.contains("same authority"));
        assert!(resolution.reasoning.contains("higher preference"));
    }

    #[test]
    fn adding_a_dominated_candidate_never_changes_the_winner() {
        let strong = BoundaryCandidate {
            candidate_id: "strong".to_string(),
            authority: 5,
            preference: 0,
            freshness: 1.0,
        };
        let weak = BoundaryCandidate {
            candidate_id: "weak".to_string(),
            authority: 1,
            preference: 10,
            freshness: 0.1,
        };
        let baseline = resolve_conflict(&[strong.clone()]);
        let with_dominated = resolve_conflict(&[strong, weak]);
        assert_eq!(baseline.winner.candidate_id, with_dominated.winner.candidate_id);
    }

    #[test]
    fn higher_authority_wins_regardless_of_preference() {
        let low_authority_best_pref = BoundaryCandidate {
            candidate_id: "low".to_string(),
            authority: 2,
            preference: 0,
            freshness: 1.0,
        };
        let high_authority_worst_pref = BoundaryCandidate {
            candidate_id: "high".to_string(),
            authority: 5,
            preference: 99,
            freshness: 0.0,
        };
        let resolution = resolve_conflict(&[low_authority_best_pref, high_authority_worst_pref]);
        assert_eq!(resolution.winner.candidate_id, "high");
        assert!(resolution.reasoning.contains("higher authority"));
    }
}
