//! The compact on-disk provenance audit entry (§3).

use serde::{Deserialize, Serialize};

/// Quality metrics attached to a discovery attempt, free-form beyond the
/// fields the spec names explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QualityMetrics {
    /// Geometry validity ratio, if computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geometry_validity: Option<f64>,
    /// Topology error count, if computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub topology_errors: Option<u32>,
    /// Any additional free-form metrics.
    #[serde(flatten)]
    pub extra: std::collections::BTreeMap<String, serde_json::Value>,
}

/// One append-only audit entry describing a single discovery attempt.
///
/// Field names are abbreviated to match the on-disk schema (§3): `f`, `n`,
/// `s`, `p`, `g`, `fc`, `conf`, `auth`, `src`, `url`, `q`, `why`, `tried`,
/// `blocked`, `ts`, `aid`, `sup`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProvenanceRecord {
    /// FIPS code of the jurisdiction.
    pub f: String,
    /// Jurisdiction name, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    /// State code, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<String>,
    /// Population, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p: Option<u64>,
    /// Granularity tier, 0 (finest) .. 4 (county fallback).
    pub g: u8,
    /// Feature count in the discovered boundary set, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fc: Option<u32>,
    /// Confidence, 0..=100.
    pub conf: u8,
    /// Authority level, 0..=5.
    pub auth: u8,
    /// Source kind string (e.g. "primary", "aggregator", "tiger").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    /// Source URL, if the attempt reached one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Quality metrics, if computed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<QualityMetrics>,
    /// Human-readable reasons for the outcome. Required, non-empty.
    pub why: Vec<String>,
    /// Sources tried, as indices into the authority entry's lists. Required, non-empty.
    pub tried: Vec<i32>,
    /// Machine-readable blocker code, or `None` if the attempt succeeded.
    pub blocked: Option<String>,
    /// ISO-8601 timestamp of the attempt.
    pub ts: String,
    /// Identifier of the worker/agent that made the attempt.
    pub aid: String,
    /// Identifier of a prior attempt this one supersedes, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sup: Option<String>,
}

/// Bounds a [`ProvenanceRecord`] must satisfy to be appended (§4.E).
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProvenanceRecordError {
    /// Granularity tier outside `[0, 4]`.
    #[error("granularity tier {0} out of range [0, 4]")]
    TierOutOfRange(u8),
    /// Confidence outside `[0, 100]`.
    #[error("confidence {0} out of range [0, 100]")]
    ConfidenceOutOfRange(u8),
    /// Authority level outside `[0, 5]`.
    #[error("authority level {0} out of range [0, 5]")]
    AuthorityOutOfRange(u8),
    /// `why` was empty.
    #[error("`why` must be non-empty")]
    EmptyWhy,
    /// `tried` was empty.
    #[error("`tried` must be non-empty")]
    EmptyTried,
    /// `ts` does not parse as RFC 3339 / ISO-8601.
    #[error("timestamp `{0}` is not valid ISO-8601")]
    InvalidTimestamp(String),
}

impl ProvenanceRecord {
    /// Validate the bounds and required fields a provenance entry must
    /// satisfy (§4.E "Entry validation"). Violations are programming errors:
    /// callers should never construct an invalid record, but a batch reader
    /// must tolerate them arriving from older/foreign writers.
    pub fn validate(&self) -> Result<(), ProvenanceRecordError> {
        if self.g > 4 {
            return Err(ProvenanceRecordError::TierOutOfRange(self.g));
        }
        if self.conf > 100 {
            return Err(ProvenanceRecordError::ConfidenceOutOfRange(self.conf));
        }
        if self.auth > 5 {
            return Err(ProvenanceRecordError::AuthorityOutOfRange(self.auth));
        }
        if self.why.is_empty() {
            return Err(ProvenanceRecordError::EmptyWhy);
        }
        if self.tried.is_empty() {
            return Err(ProvenanceRecordError::EmptyTried);
        }
        if chrono::DateTime::parse_from_rfc3339(&self.ts).is_err() {
            return Err(ProvenanceRecordError::InvalidTimestamp(self.ts.clone()));
        }
        Ok(())
    }
}
