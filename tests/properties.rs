//! Property-based tests over the crate's pure, deterministic functions.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use shadow_atlas::{
    compute_validity_window, resolve_conflict, BoundaryCandidate, BoundaryKind,
    RedistrictingCycleTable, SourceType,
};

proptest! {
    /// `resolve_conflict`'s winner always has the maximal score among its
    /// candidates, regardless of input order or magnitude.
    #[test]
    fn winner_always_has_the_highest_score(
        candidates in prop::collection::vec(
            (1u8..=5, 0u32..200, 0.0f64..1.0),
            1..12,
        )
    ) {
        let candidates: Vec<BoundaryCandidate> = candidates
            .into_iter()
            .enumerate()
            .map(|(i, (authority, preference, freshness))| BoundaryCandidate {
                candidate_id: format!("c{i}"),
                authority,
                preference,
                freshness,
            })
            .collect();

        let resolution = resolve_conflict(&candidates);
        let best_score = candidates
            .iter()
            .map(BoundaryCandidate::score)
            .fold(f64::MIN, f64::max);

        prop_assert!((resolution.winner.score() - best_score).abs() < 1e-9);
    }

    /// Confidence is always clamped to `[0, 1]` and never rises as the query
    /// instant moves forward through the validity window.
    #[test]
    fn aggregator_confidence_is_bounded_and_non_increasing(
        release_year in 2015i32..2024,
        days_into_window in 0i64..800,
    ) {
        let cycles = RedistrictingCycleTable::us_decennial();
        let release_date = Utc.with_ymd_and_hms(release_year, 7, 1, 0, 0, 0).unwrap();
        let window = compute_validity_window(
            SourceType::Tiger,
            release_date,
            BoundaryKind::County,
            "src",
            &cycles,
            release_date,
        );

        let t0 = window.valid_from + chrono::Duration::days(days_into_window.min(799));
        let t1 = window.valid_from + chrono::Duration::days((days_into_window + 1).min(799));

        let c0 = window.confidence_at(t0);
        let c1 = window.confidence_at(t1);

        prop_assert!((0.0..=1.0).contains(&c0));
        prop_assert!((0.0..=1.0).contains(&c1));
        prop_assert!(c1 <= c0 + 1e-9);
    }
}
