//! Golden and cross-module integration tests for Shadow Atlas.
//!
//! These exercise the §8 "Concrete scenarios" end to end, wiring multiple
//! components together the way a real caller would, rather than unit-testing
//! one function in isolation.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};

use shadow_atlas::{
    check_boundary_gap, compute_validity_window, resolve_conflict, AuthorityRegistry,
    BoundaryCandidate, BoundaryKind, GapRecommendation, GapStatusPhase, MerkleLeafInput,
    ProvenanceSource, RedistrictingCycleTable, SourceType, StateFinalizationRecord,
    TestHashOracle, TreeConfiguration, TreeDepth, UsPrecinctGapPolicy,
};
use shadow_atlas::merkle::tree::MerkleTree;

fn dt(y: i32, m: u32, d: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn finalization_records() -> BTreeMap<String, StateFinalizationRecord> {
    let mut m = BTreeMap::new();
    m.insert(
        "CA".to_string(),
        StateFinalizationRecord {
            state: "CA".to_string(),
            finalized_date: dt(2021, 12, 20),
            effective_date: dt(2022, 1, 1),
            court_challenged: false,
            notes: String::new(),
        },
    );
    m.insert(
        "NC".to_string(),
        StateFinalizationRecord {
            state: "NC".to_string(),
            finalized_date: dt(2021, 12, 20),
            effective_date: dt(2022, 1, 1),
            court_challenged: true,
            notes: "remanded and redrawn".to_string(),
        },
    );
    m
}

#[test]
fn scenario_1_gap_detection_california() {
    let cycles = RedistrictingCycleTable::us_decennial();
    let status = check_boundary_gap(
        &cycles,
        &finalization_records(),
        &UsPrecinctGapPolicy::new(cycles.clone()),
        BoundaryKind::NationalLegislativeLower,
        "CA",
        dt(2022, 3, 15),
    );
    assert_eq!(status.phase, GapStatusPhase::PostFinalizationPreTiger);
    assert_eq!(status.recommendation, GapRecommendation::UsePrimary);
    assert!(status.reason.contains("73"));
}

#[test]
fn scenario_2_gap_detection_north_carolina() {
    let cycles = RedistrictingCycleTable::us_decennial();
    let status = check_boundary_gap(
        &cycles,
        &finalization_records(),
        &UsPrecinctGapPolicy::new(cycles.clone()),
        BoundaryKind::NationalLegislativeLower,
        "NC",
        dt(2022, 6, 30),
    );
    assert_eq!(status.phase, GapStatusPhase::PostFinalizationPreTiger);
    assert_eq!(status.recommendation, GapRecommendation::UsePrimary);
    assert!(status.reason.contains("180"));
}

#[test]
fn scenario_3_conflict_resolution_under_gap() {
    let cycles = RedistrictingCycleTable::us_decennial();

    // The comparator/validity layers would annotate these in practice; this
    // test drives the validity window directly to derive each candidate's
    // freshness at the query instant, then resolves the conflict.
    let tiger_window = compute_validity_window(
        SourceType::Tiger,
        dt(2021, 7, 1),
        BoundaryKind::NationalLegislativeLower,
        "tiger",
        &cycles,
        dt(2022, 3, 1),
    );
    let commission_window = compute_validity_window(
        SourceType::Primary,
        dt(2022, 1, 15),
        BoundaryKind::NationalLegislativeLower,
        "state-redistricting-commission",
        &cycles,
        dt(2022, 3, 1),
    );

    let candidates = vec![
        BoundaryCandidate {
            candidate_id: "tiger".to_string(),
            authority: 5,
            preference: 3,
            freshness: tiger_window.confidence_at(dt(2022, 3, 1)),
        },
        BoundaryCandidate {
            candidate_id: "state-redistricting-commission".to_string(),
            authority: 5,
            preference: 1,
            freshness: commission_window.confidence_at(dt(2022, 3, 1)),
        },
    ];

    let resolution = resolve_conflict(&candidates);
    assert_eq!(resolution.winner.candidate_id, "state-redistricting-commission");
    assert!(resolution.reasoning.contains("same authority"));
    assert!(resolution.reasoning.contains("higher preference"));
}

#[tokio::test]
async fn scenario_5_merkle_reproducibility() {
    init_tracing();
    let oracle = TestHashOracle::default();
    let config = TreeConfiguration { depth: TreeDepth::D18, batch_size: 8 };
    let leaves: Vec<MerkleLeafInput> = (0..16)
        .map(|i| MerkleLeafInput {
            id: format!("addr{i}"),
            boundary_kind: BoundaryKind::StateLower,
            geometry_hash: format!("geomhash{i}"),
            authority_level: 5,
            source: None,
        })
        .collect();

    let tree_a = MerkleTree::build(&leaves, config, &oracle).await.unwrap();
    let tree_b = MerkleTree::build(&leaves, config, &oracle).await.unwrap();
    assert_eq!(tree_a.root().to_hex(), tree_b.root().to_hex());
}

#[tokio::test]
async fn leaf_provenance_commitment_changes_the_root() {
    let oracle = TestHashOracle::default();
    let config = TreeConfiguration { depth: TreeDepth::D18, batch_size: 4 };

    let plain = vec![MerkleLeafInput {
        id: "addr0".to_string(),
        boundary_kind: BoundaryKind::StateLower,
        geometry_hash: "geom0".to_string(),
        authority_level: 5,
        source: None,
    }];
    let with_provenance = vec![MerkleLeafInput {
        id: "addr0".to_string(),
        boundary_kind: BoundaryKind::StateLower,
        geometry_hash: "geom0".to_string(),
        authority_level: 5,
        source: Some(ProvenanceSource {
            url: "https://gis.ca.gov/districts.geojson".to_string(),
            checksum_hex: "deadbeef".to_string(),
            iso8601_timestamp: Some("2022-01-15T00:00:00Z".to_string()),
            provider_tag: Some("ca-redistricting-commission".to_string()),
        }),
    }];

    let tree_plain = MerkleTree::build(&plain, config, &oracle).await.unwrap();
    let tree_with_provenance = MerkleTree::build(&with_provenance, config, &oracle).await.unwrap();
    assert_ne!(tree_plain.root(), tree_with_provenance.root());
}

#[test]
fn authority_registry_is_total_over_registered_kinds() {
    let mut entries = BTreeMap::new();
    entries.insert(
        BoundaryKind::County,
        shadow_atlas::AuthorityEntry {
            legal_entity: "Test County Board".to_string(),
            legal_basis: "Test Code".to_string(),
            primary_sources: vec![],
            aggregator_sources: vec![],
            update_trigger: shadow_atlas::UpdateTrigger::EventDriven,
            lag_bounds: shadow_atlas::LagBounds { normal_days: 30, redistricting_days: 30 },
        },
    );
    let registry = AuthorityRegistry::new(entries, RedistrictingCycleTable::us_decennial());
    assert!(registry.get_authority(BoundaryKind::County).is_ok());
    assert!(registry.get_authority(BoundaryKind::SchoolDistrict).is_err());
}
