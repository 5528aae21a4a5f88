//! Line-based, gzip-compressed shard storage for the provenance log (§4.E).
//!
//! Each shard is read in full, decompressed, the new line appended, and
//! rewritten to a temp file which is then atomically renamed over the
//! original. A crash mid-write leaves the original shard untouched; a
//! crash after the rename but before fsync of the directory entry is the
//! one gap this doesn't close, which is why staging mode exists for
//! write-heavy callers that can't afford a shard rewrite per record.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::lock::{acquire_lock, LockError};
use crate::domain::{ProvenanceRecord, TessellationProofRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

fn io_err(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io { path: path.to_path_buf(), source }
}

fn read_existing_lines(path: &Path) -> Result<Vec<String>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = File::open(path).map_err(|e| io_err(path, e))?;
    let mut decoder = GzDecoder::new(file);
    let mut contents = String::new();
    decoder.read_to_string(&mut contents).map_err(|e| io_err(path, e))?;
    Ok(contents.lines().map(str::to_string).collect())
}

fn write_lines_atomically(path: &Path, lines: &[String]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let tmp_path = path.with_extension("ndjson.gz.tmp");
    {
        let tmp_file = File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
        let mut encoder = GzEncoder::new(tmp_file, Compression::default());
        for line in lines {
            encoder.write_all(line.as_bytes()).map_err(|e| io_err(&tmp_path, e))?;
            encoder.write_all(b"\n").map_err(|e| io_err(&tmp_path, e))?;
        }
        encoder.finish().map_err(|e| io_err(&tmp_path, e))?;
    }
    std::fs::rename(&tmp_path, path).map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Append `record` to the compressed shard at `shard_path`, holding the
/// shard's lock for the duration of the read-modify-write. Generic over the
/// record type so both discovery (`ProvenanceRecord`) and tessellation
/// (`TessellationProofRecord`) entries share the same shard mechanics.
pub fn append_to_shard<T: Serialize>(
    shard_path: &Path,
    record: &T,
    lock_retries: u32,
    lock_retry_delay: std::time::Duration,
) -> Result<(), StoreError> {
    let _guard = acquire_lock(shard_path, lock_retries, lock_retry_delay)?;
    let mut lines = read_existing_lines(shard_path)?;
    lines.push(serde_json::to_string(record)?);
    write_lines_atomically(shard_path, &lines)
}

/// Append `record` as its own plain-NDJSON file under `staging_dir`, named
/// `{agent_id}-{unix_ms}.ndjson` (§4.E "staging mode"). No locking: each
/// writer's agent id and write instant are expected to be unique enough
/// that concurrent writers don't contend for the same file name.
pub fn append_to_staging<T: Serialize>(
    staging_dir: &Path,
    agent_id: &str,
    at: DateTime<Utc>,
    record: &T,
) -> Result<PathBuf, StoreError> {
    std::fs::create_dir_all(staging_dir).map_err(|e| io_err(staging_dir, e))?;
    let file_name = format!("{}-{}.ndjson", agent_id, at.timestamp_millis());
    let path = staging_dir.join(file_name);
    let mut file = File::create(&path).map_err(|e| io_err(&path, e))?;
    let line = serde_json::to_string(record)?;
    file.write_all(line.as_bytes()).map_err(|e| io_err(&path, e))?;
    file.write_all(b"\n").map_err(|e| io_err(&path, e))?;
    Ok(path)
}

/// Result of one merge pass draining staging files into compressed shards.
#[derive(Debug, Default)]
pub struct MergeReport {
    pub merged_files: u32,
    pub merged_records: u32,
    pub failed_files: Vec<(PathBuf, String)>,
}

/// Drain every file in `staging_dir` into the shard `shard_path_for`
/// resolves for it, deleting each staging file only once every line in
/// it has been durably merged.
pub fn merge_staging<T, F>(
    staging_dir: &Path,
    shard_path_for: F,
    lock_retries: u32,
    lock_retry_delay: std::time::Duration,
) -> Result<MergeReport, StoreError>
where
    T: Serialize + DeserializeOwned,
    F: Fn(&T) -> PathBuf,
{
    let mut report = MergeReport::default();
    if !staging_dir.exists() {
        return Ok(report);
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(staging_dir)
        .map_err(|e| io_err(staging_dir, e))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().map(|ext| ext == "ndjson").unwrap_or(false))
        .collect();
    entries.sort();

    for staging_file in entries {
        match merge_one_file::<T, F>(&staging_file, &shard_path_for, lock_retries, lock_retry_delay) {
            Ok(count) => {
                report.merged_files += 1;
                report.merged_records += count;
                let _ = std::fs::remove_file(&staging_file);
            }
            Err(err) => {
                tracing::warn!(file = %staging_file.display(), %err, "staging merge failed, left in place");
                report.failed_files.push((staging_file, err.to_string()));
            }
        }
    }

    Ok(report)
}

fn merge_one_file<T, F>(
    staging_file: &Path,
    shard_path_for: &F,
    lock_retries: u32,
    lock_retry_delay: std::time::Duration,
) -> Result<u32, StoreError>
where
    T: Serialize + DeserializeOwned,
    F: Fn(&T) -> PathBuf,
{
    let file = File::open(staging_file).map_err(|e| io_err(staging_file, e))?;
    let reader = BufReader::new(file);
    let mut count = 0;
    for line in reader.lines() {
        let line = line.map_err(|e| io_err(staging_file, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let record: T = serde_json::from_str(&line)?;
        let shard_path = shard_path_for(&record);
        append_to_shard(&shard_path, &record, lock_retries, lock_retry_delay)?;
        count += 1;
    }
    Ok(count)
}

/// Predicate filter for [`query`].
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub fips: Option<String>,
    pub state: Option<String>,
    pub tier: Option<u8>,
    pub min_confidence: Option<u8>,
    pub blocked_code: Option<String>,
    pub min_authority: Option<u8>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl QueryFilter {
    pub(crate) fn matches(&self, record: &ProvenanceRecord) -> bool {
        if let Some(fips) = &self.fips {
            if &record.f != fips {
                return false;
            }
        }
        if let Some(state) = &self.state {
            if record.s.as_deref() != Some(state.as_str()) {
                return false;
            }
        }
        if let Some(tier) = self.tier {
            if record.g != tier {
                return false;
            }
        }
        if let Some(min_conf) = self.min_confidence {
            if record.conf < min_conf {
                return false;
            }
        }
        if let Some(code) = &self.blocked_code {
            if record.blocked.as_deref() != Some(code.as_str()) {
                return false;
            }
        }
        if let Some(min_auth) = self.min_authority {
            if record.auth < min_auth {
                return false;
            }
        }
        if self.start.is_some() || self.end.is_some() {
            let Ok(ts) = DateTime::parse_from_rfc3339(&record.ts) else {
                return false;
            };
            let ts = ts.with_timezone(&Utc);
            if let Some(start) = self.start {
                if ts < start {
                    return false;
                }
            }
            if let Some(end) = self.end {
                if ts > end {
                    return false;
                }
            }
        }
        true
    }
}

/// Predicate filter for tessellation-proof queries (§4.E "a similar
/// parallel tree exists").
#[derive(Debug, Clone, Default)]
pub struct TessellationQueryFilter {
    pub fips: Option<String>,
    pub validated: Option<bool>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl TessellationQueryFilter {
    pub(crate) fn matches(&self, record: &TessellationProofRecord) -> bool {
        if let Some(fips) = &self.fips {
            if &record.fips != fips {
                return false;
            }
        }
        if let Some(validated) = self.validated {
            if record.validated != validated {
                return false;
            }
        }
        if let Some(start) = self.start {
            if record.validated_at < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if record.validated_at > end {
                return false;
            }
        }
        true
    }
}

/// Scan every shard under `base` whose month falls within `[start, end]`,
/// plus all of `staging_dir`, returning records matching `predicate`.
/// Generic over the record type so discovery and tessellation queries
/// share the same scan. Malformed lines (foreign or corrupted writers) are
/// skipped rather than failing the whole query.
pub fn query<T, P>(
    base: &Path,
    staging_dir: &Path,
    prefix: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    predicate: P,
) -> Result<Vec<T>, StoreError>
where
    T: DeserializeOwned,
    P: Fn(&T) -> bool,
{
    let mut results = Vec::new();

    if base.exists() {
        let mut months: Vec<PathBuf> = std::fs::read_dir(base)
            .map_err(|e| io_err(base, e))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.is_dir())
            .collect();
        months.sort();

        for month_dir in months {
            let Some(month) = month_dir.file_name().and_then(|s| s.to_str()) else {
                continue;
            };
            if month < &start.format("%Y-%m").to_string() || month > &end.format("%Y-%m").to_string() {
                continue;
            }
            let Ok(shard_files) = std::fs::read_dir(&month_dir) else {
                continue;
            };
            for entry in shard_files.filter_map(|e| e.ok()) {
                let path = entry.path();
                let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
                    continue;
                };
                if !name.starts_with(prefix) {
                    continue;
                }
                scan_compressed_shard(&path, &predicate, &mut results);
            }
        }
    }

    if staging_dir.exists() {
        let Ok(entries) = std::fs::read_dir(staging_dir) else {
            return Ok(results);
        };
        for entry in entries.filter_map(|e| e.ok()) {
            scan_plain_file(&entry.path(), &predicate, &mut results);
        }
    }

    Ok(results)
}

fn scan_compressed_shard<T: DeserializeOwned>(path: &Path, predicate: &impl Fn(&T) -> bool, out: &mut Vec<T>) {
    let Ok(lines) = read_existing_lines(path) else {
        return;
    };
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(record) = serde_json::from_str::<T>(&line) {
            if predicate(&record) {
                out.push(record);
            }
        }
    }
}

fn scan_plain_file<T: DeserializeOwned>(path: &Path, predicate: &impl Fn(&T) -> bool, out: &mut Vec<T>) {
    let Ok(file) = File::open(path) else {
        return;
    };
    for line in BufReader::new(file).lines().filter_map(|l| l.ok()) {
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(record) = serde_json::from_str::<T>(&line) {
            if predicate(&record) {
                out.push(record);
            }
        }
    }
}
