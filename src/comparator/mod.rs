//! Primary-vs-Aggregator Comparator (§4.C): cheap HEAD-style metadata probes
//! that decide whether an aggregator (Tiger-style) source is fresher than
//! its legal primary.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BoundaryKind, GapRecommendation};
use crate::registry::AuthorityRegistry;

/// Metadata gathered by a single HEAD-style probe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProbeResult {
    /// Whether the source responded at all.
    pub available: bool,
    /// Whether the source is known not to be machine-readable (skips the
    /// probe entirely for Primary sources published only as PDFs, etc).
    pub known_non_machine_readable: bool,
    /// `Last-Modified` header value, if present.
    pub last_modified: Option<DateTime<Utc>>,
    /// `ETag` header value, if present.
    pub etag: Option<String>,
    /// `Content-Length` header value, if present.
    pub byte_length: Option<u64>,
}

/// Error surfaced by a probe after retries are exhausted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ComparatorError {
    /// The probe timed out on every retry.
    #[error("http probe of `{0}` timed out after retries")]
    HttpTimeout(String),
}

/// Adapter over a single HEAD-style metadata probe, retried with
/// exponential backoff by the caller (§4.C: 3 attempts, initial 1s, factor x2).
#[async_trait]
pub trait HeadProber: Send + Sync {
    /// Issue one probe attempt against `url`. Implementations should not
    /// retry internally — retry/backoff is the comparator's job so it can
    /// log each attempt uniformly.
    async fn probe_once(&self, url: &str) -> Result<ProbeResult, ComparatorError>;
}

/// Production [`HeadProber`] backed by a real `reqwest` client. Unlike the
/// geometry/hash/blob adapters, the comparator's HTTP client is not
/// deployment-specific, so this crate ships a working implementation rather
/// than leaving it entirely to the caller.
#[derive(Debug, Clone)]
pub struct ReqwestHeadProber {
    client: reqwest::Client,
}

impl ReqwestHeadProber {
    /// Build a prober over a pre-configured client (connection pooling,
    /// TLS, proxy settings are the caller's concern).
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

impl Default for ReqwestHeadProber {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}

#[async_trait]
impl HeadProber for ReqwestHeadProber {
    async fn probe_once(&self, url: &str) -> Result<ProbeResult, ComparatorError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|_| ComparatorError::HttpTimeout(url.to_string()))?;

        if !response.status().is_success() {
            return Ok(ProbeResult { available: false, ..Default::default() });
        }

        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let etag = response
            .headers()
            .get(reqwest::header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let byte_length = response
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok());

        Ok(ProbeResult {
            available: true,
            known_non_machine_readable: false,
            last_modified,
            etag,
            byte_length,
        })
    }
}

/// Timeout/retry configuration for [`TigerComparator`].
#[derive(Debug, Clone, Copy)]
pub struct ComparatorConfig {
    /// Per-attempt timeout.
    pub probe_timeout: Duration,
    /// Maximum attempts before surfacing [`ComparatorError::HttpTimeout`].
    pub max_retries: u32,
    /// Initial backoff delay; doubles each retry.
    pub initial_backoff: Duration,
}

impl Default for ComparatorConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(5),
            max_retries: 3,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

async fn probe_with_retry(
    prober: &dyn HeadProber,
    url: &str,
    config: &ComparatorConfig,
) -> Result<ProbeResult, ComparatorError> {
    use backoff::{exponential::ExponentialBackoffBuilder, Error as BackoffError};

    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(config.initial_backoff)
        .with_multiplier(2.0)
        .with_max_elapsed_time(Some(config.initial_backoff * (1 << config.max_retries.min(16)) * 4))
        .build();

    let attempt = std::sync::atomic::AtomicU32::new(0);

    backoff::future::retry(policy, || {
        let attempt_no = attempt.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        async move {
            match tokio::time::timeout(config.probe_timeout, prober.probe_once(url)).await {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(err)) => {
                    if attempt_no >= config.max_retries {
                        tracing::error!(url, attempt_no, "head probe exhausted retries: {err}");
                        Err(BackoffError::permanent(err))
                    } else {
                        tracing::warn!(url, attempt_no, "head probe failed, retrying");
                        Err(BackoffError::transient(err))
                    }
                }
                Err(_elapsed) => {
                    let err = ComparatorError::HttpTimeout(url.to_string());
                    if attempt_no >= config.max_retries {
                        tracing::error!(url, attempt_no, "head probe timed out on final attempt");
                        Err(BackoffError::permanent(err))
                    } else {
                        tracing::warn!(url, attempt_no, "head probe timed out, retrying");
                        Err(BackoffError::transient(err))
                    }
                }
            }
        }
    })
    .await
}

/// Freshness verdict for the aggregator (Tiger) side of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TigerFreshness {
    /// The aggregator is at least as fresh as the primary.
    Fresh,
    /// The aggregator is stale relative to the primary.
    Stale,
    /// Freshness could not be determined from available metadata.
    Unknown,
}

/// Result of comparing a Primary source against its Tiger/Aggregator
/// counterpart (§4.C decision table).
#[derive(Debug, Clone, PartialEq)]
pub struct TigerComparison {
    /// Freshness verdict.
    pub freshness: TigerFreshness,
    /// What a caller should do.
    pub recommendation: GapRecommendation,
    /// Days the primary leads the aggregator by, when known.
    pub lag_days: Option<i64>,
    /// A warning to surface alongside the comparison, if any.
    pub warning: Option<String>,
}

/// Performs metadata-only freshness comparisons (§4.C).
pub struct TigerComparator<P: HeadProber> {
    prober: P,
    config: ComparatorConfig,
}

impl<P: HeadProber> TigerComparator<P> {
    /// Build a comparator over a given prober and configuration.
    pub fn new(prober: P, config: ComparatorConfig) -> Self {
        Self { prober, config }
    }

    /// Compare a primary source against its Tiger/Aggregator counterpart.
    pub async fn compare(
        &self,
        primary_url: &str,
        primary_machine_readable: bool,
        tiger_url: &str,
    ) -> TigerComparison {
        let (primary, tiger) = tokio::join!(
            probe_with_retry(&self.prober, primary_url, &self.config),
            probe_with_retry(&self.prober, tiger_url, &self.config),
        );

        let primary = primary.ok().filter(|_| primary_machine_readable);
        let tiger = tiger.ok();

        let primary_unavailable_or_unreadable = match &primary {
            Some(p) => !p.available || p.known_non_machine_readable,
            None => true,
        };

        if primary_unavailable_or_unreadable {
            return TigerComparison {
                freshness: TigerFreshness::Fresh,
                recommendation: GapRecommendation::UseTiger,
                lag_days: None,
                warning: Some("primary source unavailable or not machine-readable".to_string()),
            };
        }

        let tiger_unavailable = tiger.as_ref().map_or(true, |t| !t.available);
        if tiger_unavailable {
            return TigerComparison {
                freshness: TigerFreshness::Stale,
                recommendation: GapRecommendation::UsePrimary,
                lag_days: None,
                warning: Some("tiger/aggregator source unavailable".to_string()),
            };
        }

        let primary = primary.expect("checked above");
        let tiger = tiger.expect("checked above");

        match (primary.last_modified, tiger.last_modified) {
            (Some(p_lm), Some(t_lm)) => {
                if p_lm > t_lm {
                    let lag_days = (p_lm - t_lm).num_days();
                    TigerComparison {
                        freshness: TigerFreshness::Stale,
                        recommendation: GapRecommendation::UsePrimary,
                        lag_days: Some(lag_days),
                        warning: None,
                    }
                } else {
                    TigerComparison {
                        freshness: TigerFreshness::Fresh,
                        recommendation: GapRecommendation::UseTiger,
                        lag_days: None,
                        warning: None,
                    }
                }
            }
            _ => TigerComparison {
                freshness: TigerFreshness::Unknown,
                recommendation: GapRecommendation::ManualReview,
                lag_days: None,
                warning: Some("last-modified metadata unavailable on one or both sides".to_string()),
            },
        }
    }
}

/// A named freshness discrepancy surfaced by [`run_freshness_audit`].
#[derive(Debug, Clone, PartialEq)]
pub struct FreshnessAlert {
    /// Boundary kind the audit was run for.
    pub kind: BoundaryKind,
    /// Jurisdiction the discrepancy was found in.
    pub jurisdiction: String,
    /// The comparison that triggered the alert.
    pub comparison: TigerComparison,
}

/// Receives [`FreshnessAlert`]s from [`run_freshness_audit`]. Invoked
/// sequentially; a handler that panics is isolated (caught and logged) so
/// it never prevents other handlers or other alerts from running (§4.C).
pub trait FreshnessAlertHandler: Send + Sync {
    /// Handle one alert.
    fn handle(&self, alert: &FreshnessAlert);
}

/// A [`FreshnessAlertHandler`] that discards every alert, for callers that
/// don't need alerting wired up yet (e.g. tests, or a freshness audit run
/// purely for its return value).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpFreshnessAlertHandler;

impl FreshnessAlertHandler for NoOpFreshnessAlertHandler {
    fn handle(&self, _alert: &FreshnessAlert) {}
}

fn invoke_handler_isolated(handler: &dyn FreshnessAlertHandler, alert: &FreshnessAlert) {
    let result = std::panic::catch_unwind(AssertUnwindSafe(|| handler.handle(alert)));
    if let Err(panic) = result {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        tracing::error!(
            kind = %alert.kind,
            jurisdiction = %alert.jurisdiction,
            "freshness alert handler panicked: {message}"
        );
    }
}

/// Batches all jurisdictions the registry knows about for `kind`, comparing
/// each primary/aggregator pair and emitting a [`FreshnessAlert`] through
/// every registered handler whenever the recommendation is not `use-tiger`.
pub async fn run_freshness_audit<P: HeadProber>(
    comparator: &TigerComparator<P>,
    registry: &AuthorityRegistry,
    kind: BoundaryKind,
    handlers: &[Box<dyn FreshnessAlertHandler>],
) -> Result<Vec<FreshnessAlert>, crate::registry::RegistryError> {
    let entry = registry.get_authority(kind)?;

    let mut jurisdictions: Vec<&str> = entry
        .primary_sources
        .iter()
        .map(|s| s.jurisdiction.as_str())
        .collect();
    jurisdictions.sort_unstable();
    jurisdictions.dedup();

    let mut alerts = Vec::new();
    for jurisdiction in jurisdictions {
        let primary = entry
            .primary_sources
            .iter()
            .find(|s| s.claims(jurisdiction));
        let tiger = entry
            .aggregator_sources
            .iter()
            .find(|s| s.claims(jurisdiction));

        let (primary, tiger) = match (primary, tiger) {
            (Some(p), Some(t)) => (p, t),
            _ => continue,
        };

        let comparison = comparator
            .compare(&primary.url, primary.machine_readable, &tiger.url)
            .await;

        if comparison.recommendation != GapRecommendation::UseTiger {
            let alert = FreshnessAlert {
                kind,
                jurisdiction: jurisdiction.to_string(),
                comparison,
            };
            for handler in handlers {
                invoke_handler_isolated(handler.as_ref(), &alert);
            }
            alerts.push(alert);
        }
    }

    Ok(alerts)
}
