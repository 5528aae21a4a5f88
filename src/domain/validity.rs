//! Validity windows, redistricting cycles, and gap-status data types.
//!
//! This module holds the data shapes; the piecewise decision logic that
//! produces them lives in [`crate::validity`].

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::SourceType;

/// A fixed 10-year redistricting cycle anchored on a census year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedistrictingCycle {
    /// The census year that seeds this cycle (e.g. 2020).
    pub census_year: i32,
    /// The year by which most states have finalized new maps (census_year + 1).
    pub finalization_year: i32,
    /// The year in which the post-finalization gap is observed (census_year + 2).
    pub gap_year: i32,
}

impl RedistrictingCycle {
    /// Construct the cycle anchored on `census_year`.
    pub fn for_census_year(census_year: i32) -> Self {
        Self {
            census_year,
            finalization_year: census_year + 1,
            gap_year: census_year + 2,
        }
    }

    /// Jan 1 of the gap year: start of the redistricting gap window.
    pub fn gap_start(&self) -> DateTime<Utc> {
        date_utc(self.gap_year, 1, 1)
    }

    /// Jul 1 of the gap year: end of the redistricting gap window.
    pub fn gap_end(&self) -> DateTime<Utc> {
        date_utc(self.gap_year, 7, 1)
    }

    /// Expected release date of the Tiger/aggregator update that closes the gap.
    pub fn tiger_expected_release(&self) -> DateTime<Utc> {
        date_utc(self.gap_year, 7, 15)
    }

    /// Jan 1 of the cycle after next (the start of the following census's
    /// "new maps in force" period), used as the Primary validity ceiling.
    pub fn next_cycle_start(&self) -> DateTime<Utc> {
        date_utc(self.census_year + 10, 1, 1)
    }
}

fn date_utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    chrono::Utc
        .with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .expect("malformed redistricting cycle date")
}

/// The known table of redistricting cycles, process-wide and immutable.
///
/// Ordered by `census_year` ascending; lookups assume this invariant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedistrictingCycleTable {
    cycles: Vec<RedistrictingCycle>,
}

impl RedistrictingCycleTable {
    /// Build a table from an explicit list of census years. Non-US deployments
    /// supply their own census years rather than relying on a baked-in US table.
    pub fn from_census_years(mut census_years: Vec<i32>) -> Self {
        census_years.sort_unstable();
        census_years.dedup();
        Self {
            cycles: census_years
                .into_iter()
                .map(RedistrictingCycle::for_census_year)
                .collect(),
        }
    }

    /// The standard US decennial census table (1990 .. 2040), wide enough to
    /// cover any historical or near-future query.
    pub fn us_decennial() -> Self {
        Self::from_census_years((1990..=2040).step_by(10).collect())
    }

    /// All registered cycles, ascending by census year.
    pub fn cycles(&self) -> &[RedistrictingCycle] {
        &self.cycles
    }

    /// Whether `year` is a registered cycle's finalization or gap year.
    pub fn is_redistricting_window(&self, year: i32) -> bool {
        self.cycles
            .iter()
            .any(|c| c.finalization_year == year || c.gap_year == year)
    }

    /// The cycle whose gap year equals `year`, if any.
    pub fn cycle_for_gap_year(&self, year: i32) -> Option<&RedistrictingCycle> {
        self.cycles.iter().find(|c| c.gap_year == year)
    }

    /// The first cycle whose `next_cycle_start()` lies strictly after `instant`.
    pub fn next_cycle_start_after(&self, instant: DateTime<Utc>) -> DateTime<Utc> {
        self.cycles
            .iter()
            .map(|c| c.next_cycle_start())
            .find(|start| *start > instant)
            .unwrap_or_else(|| {
                // Table exhausted: extrapolate one more decade past the last entry.
                let last = self.cycles.last().expect("empty redistricting cycle table");
                date_utc(last.census_year + 20, 1, 1)
            })
    }
}

/// Sub-phase of a redistricting-year confidence clamp (§4.B).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapPhase {
    /// Finalization year: `year mod 10 == 1`.
    PreGap,
    /// Gap year, first half: `year mod 10 == 2 and month <= 6`.
    Gap,
    /// Gap year, second half: `year mod 10 == 2 and month >= 7`.
    PostTigerUpdate,
}

impl GapPhase {
    /// The floor confidence this phase clamps an Aggregator/Tiger source to,
    /// before the boundary-kind multiplier is applied.
    pub fn floor_confidence(self) -> f64 {
        match self {
            Self::PreGap => 0.5,
            Self::Gap => 0.3,
            Self::PostTigerUpdate => 0.9,
        }
    }

    /// Classify `now` against the known cycle table, if it falls in a
    /// finalization or gap year.
    pub fn classify(table: &RedistrictingCycleTable, now: DateTime<Utc>) -> Option<Self> {
        let year = now.year();
        let month = now.month();
        if table
            .cycles()
            .iter()
            .any(|c| c.finalization_year == year)
        {
            return Some(Self::PreGap);
        }
        if table.cycles().iter().any(|c| c.gap_year == year) {
            return Some(if month <= 6 {
                Self::Gap
            } else {
                Self::PostTigerUpdate
            });
        }
        None
    }
}

/// `(validFrom, validUntil, confidence-function)` for one source instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidityWindow {
    /// Identifier of the source this window describes (its URL, by convention).
    pub source_id: String,
    /// Category of the source.
    pub source_type: SourceType,
    /// Start of the window, inclusive.
    pub valid_from: DateTime<Utc>,
    /// End of the window, exclusive.
    pub valid_until: DateTime<Utc>,
    /// Gap-phase clamp applied at construction time, if any (Aggregator/Tiger only).
    pub gap_clamp: Option<(GapPhase, f64)>,
}

impl ValidityWindow {
    /// Confidence of this window's source at a given instant, per §3/§4.B.
    ///
    /// Outside `[valid_from, valid_until)` the confidence is always 0.
    pub fn confidence_at(&self, at: DateTime<Utc>) -> f64 {
        if at < self.valid_from || at >= self.valid_until {
            return 0.0;
        }
        match self.source_type {
            SourceType::Primary => 1.0,
            SourceType::Aggregator | SourceType::Tiger => {
                let total = (self.valid_until - self.valid_from)
                    .num_milliseconds()
                    .max(1) as f64;
                let elapsed = (at - self.valid_from).num_milliseconds() as f64;
                let fraction = (elapsed / total).clamp(0.0, 1.0);

                let floor = if let Some((_, clamped_floor)) = self.gap_clamp {
                    clamped_floor
                } else {
                    0.4
                };

                if fraction <= 0.75 {
                    1.0
                } else {
                    // Linear decay from 1.0 at 75% elapsed to `floor` at 100% elapsed.
                    let decay_fraction = (fraction - 0.75) / 0.25;
                    1.0 - decay_fraction * (1.0 - floor)
                }
            }
        }
    }
}

/// Historical record of when a state's new maps took legal effect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateFinalizationRecord {
    /// State or jurisdiction code (e.g. "CA").
    pub state: String,
    /// Date the legislature/commission finalized the new map.
    pub finalized_date: DateTime<Utc>,
    /// Date the new map took legal effect.
    pub effective_date: DateTime<Utc>,
    /// Whether the map was challenged in court.
    pub court_challenged: bool,
    /// Free-text notes.
    pub notes: String,
}

/// Recommendation accompanying a [`GapStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapRecommendation {
    /// Prefer the Tiger/Aggregator source.
    UseTiger,
    /// Prefer the Primary source.
    UsePrimary,
    /// Neither source should be trusted yet; wait.
    Wait,
    /// Ambiguous; a human should decide.
    ManualReview,
}

/// Result of [`crate::validity::check_boundary_gap`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapStatus {
    /// Which redistricting sub-phase, if any, produced this status.
    pub phase: GapStatusPhase,
    /// What a caller should do.
    pub recommendation: GapRecommendation,
    /// Human-readable explanation, e.g. a day-count lag.
    pub reason: String,
}

/// The named phases `checkBoundaryGap` can return (distinct from [`GapPhase`],
/// which is the confidence-clamp sub-phase used only for Aggregator/Tiger decay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapStatusPhase {
    /// No gap is in effect.
    None,
    /// Before the new map's legal effective date.
    PreFinalization,
    /// After finalization but before the Tiger update lands.
    PostFinalizationPreTiger,
    /// After the Tiger update has landed.
    PostTiger,
}
