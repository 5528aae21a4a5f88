//! Provenance Log (§4.E): the append-only, sharded audit trail of every
//! discovery and tessellation-validation attempt.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `SHADOW_ATLAS_PROVENANCE_BASE_DIR`: shard root directory (default: `./data/provenance`)
//! - `SHADOW_ATLAS_STAGING_MODE`: `true` to bypass per-append locking and defer to the merge worker (default: `false`)
//! - `SHADOW_ATLAS_LOCK_RETRIES`: shard lock retry attempts (default: 50)
//! - `SHADOW_ATLAS_LOCK_RETRY_DELAY_MS`: initial retry backoff in milliseconds (default: 100)

pub mod lock;
pub mod shard;
pub mod store;

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::domain::{ProvenanceRecord, ProvenanceRecordError, TessellationProofRecord};
use shard::{discovery_shard_path, staging_dir, tessellation_shard_path, tessellation_staging_dir};
use store::{MergeReport, QueryFilter, StoreError, TessellationQueryFilter};

#[derive(Debug, thiserror::Error)]
pub enum ProvenanceLogError {
    #[error(transparent)]
    Validation(#[from] ProvenanceRecordError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Configuration for the provenance log's storage layout and lock
/// retry behavior.
#[derive(Debug, Clone)]
pub struct ProvenanceLogConfig {
    /// Root directory under which `YYYY-MM` shard directories live.
    pub base_dir: PathBuf,
    /// When true, appends go to per-record staging files instead of
    /// locking and rewriting a shard directly; a separate merge pass
    /// drains staging into shards later.
    pub staging_mode: bool,
    /// Shard lock retry attempts (default: 50).
    pub lock_retries: u32,
    /// Initial lock retry backoff (default: 100ms).
    pub lock_retry_delay: Duration,
}

impl ProvenanceLogConfig {
    /// Load configuration from environment variables with production defaults.
    pub fn from_env() -> Self {
        Self {
            base_dir: std::env::var("SHADOW_ATLAS_PROVENANCE_BASE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data/provenance")),
            staging_mode: std::env::var("SHADOW_ATLAS_STAGING_MODE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(false),
            lock_retries: std::env::var("SHADOW_ATLAS_LOCK_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(50),
            lock_retry_delay: std::env::var("SHADOW_ATLAS_LOCK_RETRY_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or_else(|| Duration::from_millis(100)),
        }
    }
}

impl Default for ProvenanceLogConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// The provenance log: append-only, sharded, gzip-compressed, lock-protected.
pub struct ProvenanceLog {
    config: ProvenanceLogConfig,
}

impl ProvenanceLog {
    pub fn new(config: ProvenanceLogConfig) -> Self {
        Self { config }
    }

    fn staging_dir(&self) -> PathBuf {
        staging_dir(&self.config.base_dir)
    }

    fn tessellation_staging_dir(&self) -> PathBuf {
        tessellation_staging_dir(&self.config.base_dir)
    }

    /// Append a discovery-attempt record, validating it first (§4.E).
    pub fn append_discovery(&self, record: &ProvenanceRecord, at: DateTime<Utc>) -> Result<(), ProvenanceLogError> {
        record.validate()?;
        if self.config.staging_mode {
            store::append_to_staging(&self.staging_dir(), &record.aid, at, record)?;
        } else {
            let path = discovery_shard_path(&self.config.base_dir, at, &record.f);
            store::append_to_shard(&path, record, self.config.lock_retries, self.config.lock_retry_delay)?;
        }
        Ok(())
    }

    /// Append a tessellation-validation record (§4.E "a similar parallel
    /// tree exists"). Carries the four-axiom proof and the validated
    /// geometry's hash so a later reader can check
    /// [`TessellationProofRecord::is_validation_current`] without
    /// re-running the validator.
    pub fn append_tessellation(
        &self,
        record: &TessellationProofRecord,
        at: DateTime<Utc>,
    ) -> Result<(), ProvenanceLogError> {
        if self.config.staging_mode {
            store::append_to_staging(&self.tessellation_staging_dir(), &record.validator_version, at, record)?;
        } else {
            let path = tessellation_shard_path(&self.config.base_dir, at, &record.fips);
            store::append_to_shard(&path, record, self.config.lock_retries, self.config.lock_retry_delay)?;
        }
        Ok(())
    }

    /// Drain staging files accumulated under staging mode into compressed
    /// discovery shards, keyed by each record's own FIPS code and a
    /// `discovery` target timestamp supplied per call (usually "now").
    pub fn merge_discovery_staging(&self, at: DateTime<Utc>) -> Result<MergeReport, ProvenanceLogError> {
        let base = self.config.base_dir.clone();
        let report = store::merge_staging::<ProvenanceRecord, _>(
            &self.staging_dir(),
            move |record| discovery_shard_path(&base, at, &record.f),
            self.config.lock_retries,
            self.config.lock_retry_delay,
        )?;
        Ok(report)
    }

    /// Drain staging files accumulated under staging mode into compressed
    /// tessellation shards, keyed by each record's own FIPS code.
    pub fn merge_tessellation_staging(&self, at: DateTime<Utc>) -> Result<MergeReport, ProvenanceLogError> {
        let base = self.config.base_dir.clone();
        let report = store::merge_staging::<TessellationProofRecord, _>(
            &self.tessellation_staging_dir(),
            move |record| tessellation_shard_path(&base, at, &record.fips),
            self.config.lock_retries,
            self.config.lock_retry_delay,
        )?;
        Ok(report)
    }

    /// Query discovery records across shards within `[start, end]`, plus
    /// any unmmerged staging records.
    pub fn query_discovery(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: &QueryFilter,
    ) -> Result<Vec<ProvenanceRecord>, ProvenanceLogError> {
        let records = store::query::<ProvenanceRecord, _>(
            &self.config.base_dir,
            &self.staging_dir(),
            "discovery-log-",
            start,
            end,
            |r| filter.matches(r),
        )?;
        Ok(records)
    }

    /// Query tessellation-validation records across shards within
    /// `[start, end]`, plus any unmerged staging records.
    pub fn query_tessellation(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        filter: &TessellationQueryFilter,
    ) -> Result<Vec<TessellationProofRecord>, ProvenanceLogError> {
        let records = store::query::<TessellationProofRecord, _>(
            &self.config.base_dir,
            &self.tessellation_staging_dir(),
            "tessellation-log-",
            start,
            end,
            |r| filter.matches(r),
        )?;
        Ok(records)
    }
}

pub use store::{QueryFilter as ProvenanceQueryFilter, TessellationQueryFilter};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample(fips: &str, ts: &str) -> ProvenanceRecord {
        ProvenanceRecord {
            f: fips.to_string(),
            n: None,
            s: Some("CA".to_string()),
            p: None,
            g: 1,
            fc: None,
            conf: 90,
            auth: 5,
            src: Some("primary".to_string()),
            url: None,
            q: None,
            why: vec!["primary source fresh".to_string()],
            tried: vec![0],
            blocked: None,
            ts: ts.to_string(),
            aid: "worker-1".to_string(),
            sup: None,
        }
    }

    #[test]
    fn direct_append_then_query_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProvenanceLogConfig {
            base_dir: dir.path().join("provenance"),
            staging_mode: false,
            lock_retries: 5,
            lock_retry_delay: Duration::from_millis(5),
        };
        let log = ProvenanceLog::new(config);
        let at = Utc.with_ymd_and_hms(2022, 3, 15, 0, 0, 0).unwrap();
        log.append_discovery(&sample("06037", "2022-03-15T00:00:00Z"), at).unwrap();

        let results = log
            .query_discovery(
                Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2022, 12, 31, 0, 0, 0).unwrap(),
                &QueryFilter::default(),
            )
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].f, "06037");
    }

    #[test]
    fn invalid_record_is_rejected_before_touching_disk() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProvenanceLogConfig {
            base_dir: dir.path().join("provenance"),
            staging_mode: false,
            lock_retries: 5,
            lock_retry_delay: Duration::from_millis(5),
        };
        let log = ProvenanceLog::new(config);
        let mut bad = sample("06037", "2022-03-15T00:00:00Z");
        bad.why.clear();
        let at = Utc.with_ymd_and_hms(2022, 3, 15, 0, 0, 0).unwrap();
        assert!(log.append_discovery(&bad, at).is_err());
        assert!(!dir.path().join("provenance").exists());
    }

    #[test]
    fn staging_mode_then_merge_makes_records_queryable() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProvenanceLogConfig {
            base_dir: dir.path().join("provenance"),
            staging_mode: true,
            lock_retries: 5,
            lock_retry_delay: Duration::from_millis(5),
        };
        let log = ProvenanceLog::new(config);
        let at = Utc.with_ymd_and_hms(2022, 3, 15, 0, 0, 0).unwrap();
        log.append_discovery(&sample("06037", "2022-03-15T00:00:00Z"), at).unwrap();

        let report = log.merge_discovery_staging(at).unwrap();
        assert_eq!(report.merged_records, 1);

        let results = log
            .query_discovery(
                Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2022, 12, 31, 0, 0, 0).unwrap(),
                &QueryFilter::default(),
            )
            .unwrap();
        assert_eq!(results.len(), 1);
    }

    fn tessellation_sample(fips: &str, validated: bool) -> TessellationProofRecord {
        TessellationProofRecord {
            fips: fips.to_string(),
            validated,
            validated_at: Utc.with_ymd_and_hms(2022, 3, 15, 0, 0, 0).unwrap(),
            geometry_hash: "deadbeef".to_string(),
            axiom_results: crate::domain::AxiomResults {
                exclusivity: validated,
                exhaustivity: validated,
                containment: validated,
                cardinality: validated,
            },
            diagnostics: crate::domain::TessellationDiagnostics::default(),
            failed_axiom: None,
            failure_reason: None,
            problematic_districts: vec![],
            validator_version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn tessellation_append_then_query_round_trips_the_four_axiom_proof() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProvenanceLogConfig {
            base_dir: dir.path().join("provenance"),
            staging_mode: false,
            lock_retries: 5,
            lock_retry_delay: Duration::from_millis(5),
        };
        let log = ProvenanceLog::new(config);
        let at = Utc.with_ymd_and_hms(2022, 3, 15, 0, 0, 0).unwrap();
        log.append_tessellation(&tessellation_sample("06037", true), at).unwrap();

        let results = log
            .query_tessellation(
                Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2022, 12, 31, 0, 0, 0).unwrap(),
                &TessellationQueryFilter::default(),
            )
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].axiom_results.all_passed());
        assert!(results[0].is_validation_current("deadbeef"));
    }

    #[test]
    fn tessellation_staging_mode_then_merge_makes_records_queryable() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProvenanceLogConfig {
            base_dir: dir.path().join("provenance"),
            staging_mode: true,
            lock_retries: 5,
            lock_retry_delay: Duration::from_millis(5),
        };
        let log = ProvenanceLog::new(config);
        let at = Utc.with_ymd_and_hms(2022, 3, 15, 0, 0, 0).unwrap();
        log.append_tessellation(&tessellation_sample("06037", false), at).unwrap();

        let report = log.merge_tessellation_staging(at).unwrap();
        assert_eq!(report.merged_records, 1);

        let results = log
            .query_tessellation(
                Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2022, 12, 31, 0, 0, 0).unwrap(),
                &TessellationQueryFilter { validated: Some(false), ..Default::default() },
            )
            .unwrap();
        assert_eq!(results.len(), 1);
    }
}
