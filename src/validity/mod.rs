//! Validity & Gap Engine (§4.B): pure functions computing validity windows
//! and redistricting-gap status. No I/O, no mutation; every time argument
//! flows through an explicit [`chrono::DateTime<Utc>`] so callers (and
//! tests) fully control "now" via [`crate::adapters::Clock`].

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Utc};

use crate::domain::{
    BoundaryKind, GapPhase, GapRecommendation, GapStatus, GapStatusPhase,
    RedistrictingCycleTable, SourceType, StateFinalizationRecord, ValidityWindow,
};

/// Computes the validity window for a source release (§4.B rules table).
pub fn compute_validity_window(
    source_type: SourceType,
    release_date: DateTime<Utc>,
    boundary_kind: BoundaryKind,
    source_id: &str,
    cycles: &RedistrictingCycleTable,
    now: DateTime<Utc>,
) -> ValidityWindow {
    match source_type {
        SourceType::Primary => ValidityWindow {
            source_id: source_id.to_string(),
            source_type,
            valid_from: release_date,
            valid_until: cycles.next_cycle_start_after(release_date),
            gap_clamp: None,
        },
        SourceType::Aggregator | SourceType::Tiger => {
            let valid_from = jul_1(release_date.year());
            let valid_until = jul_1(release_date.year() + 1);
            let gap_clamp = GapPhase::classify(cycles, now).map(|phase| {
                (phase, phase.floor_confidence() * boundary_kind.gap_multiplier())
            });
            ValidityWindow {
                source_id: source_id.to_string(),
                source_type,
                valid_from,
                valid_until,
                gap_clamp,
            }
        }
    }
}

fn jul_1(year: i32) -> DateTime<Utc> {
    use chrono::TimeZone;
    Utc.with_ymd_and_hms(year, 7, 1, 0, 0, 0)
        .single()
        .expect("malformed validity-window year")
}

/// True iff `now.year()` is a registered gap year and `now.month() ∈ [1, 6]`,
/// evaluated in UTC (§4.B, §8).
pub fn is_in_redistricting_gap(cycles: &RedistrictingCycleTable, now: DateTime<Utc>) -> bool {
    matches!(GapPhase::classify(cycles, now), Some(GapPhase::Gap))
}

/// Per-jurisdiction decision about precinct-kind gap behavior, kept
/// pluggable (§9 Open Questions: "voting-precinct gap periods in non-US
/// jurisdictions is implied but not documented").
pub trait PrecinctGapPolicy: Send + Sync {
    /// Decide the gap status for a voting-precinct boundary at `now`.
    fn check_precinct_gap(&self, now: DateTime<Utc>) -> GapStatus;
}

/// Default US precinct policy: precincts are assumed stale (favor the
/// Primary) during Q1 of any year, when election officials are most likely
/// to be realigning precincts to newly effective district lines, and during
/// the two years immediately following a redistricting gap year, when that
/// realignment is still catching up.
#[derive(Debug, Clone)]
pub struct UsPrecinctGapPolicy {
    cycles: RedistrictingCycleTable,
}

impl UsPrecinctGapPolicy {
    /// Build the policy over a redistricting cycle table.
    pub fn new(cycles: RedistrictingCycleTable) -> Self {
        Self { cycles }
    }

    fn is_post_redistricting_year(&self, year: i32) -> bool {
        self.cycles
            .cycles()
            .iter()
            .any(|c| year == c.gap_year + 1 || year == c.gap_year + 2)
    }
}

impl PrecinctGapPolicy for UsPrecinctGapPolicy {
    fn check_precinct_gap(&self, now: DateTime<Utc>) -> GapStatus {
        let in_q1 = now.month() <= 3;
        if in_q1 || self.is_post_redistricting_year(now.year()) {
            GapStatus {
                phase: GapStatusPhase::PostFinalizationPreTiger,
                recommendation: GapRecommendation::UsePrimary,
                reason: "voting precinct boundaries lag legislative redistricting".to_string(),
            }
        } else {
            GapStatus {
                phase: GapStatusPhase::None,
                recommendation: GapRecommendation::UseTiger,
                reason: "no known precinct realignment in progress".to_string(),
            }
        }
    }
}

fn none_use_tiger() -> GapStatus {
    GapStatus {
        phase: GapStatusPhase::None,
        recommendation: GapRecommendation::UseTiger,
        reason: "boundary kind is not subject to redistricting-gap staleness".to_string(),
    }
}

/// Determine the redistricting gap status for a boundary kind/jurisdiction
/// at `now` (§4.B algorithm).
///
/// `finalization_records` is keyed by jurisdiction code (e.g. "CA"); a
/// missing record for a legislative kind inside an active cycle is itself
/// not a programming error (historical records are populated over time) and
/// resolves to a `manual-review` recommendation.
pub fn check_boundary_gap(
    cycles: &RedistrictingCycleTable,
    finalization_records: &BTreeMap<String, StateFinalizationRecord>,
    precinct_policy: &dyn PrecinctGapPolicy,
    kind: BoundaryKind,
    jurisdiction: &str,
    now: DateTime<Utc>,
) -> GapStatus {
    if kind.is_precinct() {
        return precinct_policy.check_precinct_gap(now);
    }

    if !kind.is_legislative() {
        return none_use_tiger();
    }

    if !cycles.is_redistricting_window(now.year()) {
        return none_use_tiger();
    }

    let cycle = match cycles
        .cycles()
        .iter()
        .find(|c| c.finalization_year == now.year() || c.gap_year == now.year())
    {
        Some(c) => c,
        None => return none_use_tiger(),
    };

    match finalization_records.get(jurisdiction) {
        None => GapStatus {
            phase: GapStatusPhase::None,
            recommendation: GapRecommendation::ManualReview,
            reason: format!(
                "no state finalization record for `{jurisdiction}` in cycle {}",
                cycle.census_year
            ),
        },
        Some(record) => {
            if now < record.effective_date {
                GapStatus {
                    phase: GapStatusPhase::PreFinalization,
                    recommendation: GapRecommendation::UseTiger,
                    reason: "new map not yet legally effective".to_string(),
                }
            } else if now < cycle.gap_end() {
                let lag_days = (now - record.effective_date).num_days();
                GapStatus {
                    phase: GapStatusPhase::PostFinalizationPreTiger,
                    recommendation: GapRecommendation::UsePrimary,
                    reason: format!(
                        "new map effective {} days ago, Tiger update not yet expected",
                        lag_days
                    ),
                }
            } else {
                GapStatus {
                    phase: GapStatusPhase::PostTiger,
                    recommendation: GapRecommendation::UseTiger,
                    reason: "Tiger update window has passed".to_string(),
                }
            }
        }
    }
}
