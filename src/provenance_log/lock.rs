//! Advisory locking for the provenance log's append protocol (§4.E).
//!
//! Two layers stack: an `O_CREAT|O_EXCL` sidecar lock file gives atomic
//! mutual exclusion across processes on any POSIX filesystem, and
//! `fs2::FileExt::lock_exclusive` adds a kernel-level advisory lock on the
//! data file itself so a crashed holder doesn't wedge the shard forever
//! (the OS releases the lock when the holding process dies; the sidecar
//! file does not).

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use backoff::{exponential::ExponentialBackoffBuilder, Error as BackoffError};
use fs2::FileExt;
use rand::Rng;

/// Errors from the lock-acquisition protocol.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("failed to acquire lock on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("lock on {0} was not acquired within the retry budget")]
    Timeout(PathBuf),
}

fn lock_sidecar_path(data_path: &Path) -> PathBuf {
    let mut os = data_path.as_os_str().to_owned();
    os.push(".lock");
    PathBuf::from(os)
}

/// Holds both the sidecar lock file and an advisory lock on `data_path`
/// for as long as it's alive. Declared *before* any data file handle at
/// the call site so Rust's reverse-declaration-order `Drop` closes the
/// data file first and releases the lock sidecar last.
pub struct LockGuard {
    sidecar_path: PathBuf,
    // Held open only so the descriptor stays alive until `Drop` runs; never
    // read directly.
    #[allow(dead_code)]
    sidecar: File,
    data_lock: File,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.data_lock);
        let _ = std::fs::remove_file(&self.sidecar_path);
    }
}

/// Acquire an exclusive lock on `data_path`, creating the file if absent.
///
/// Retries at a constant `initial_delay` interval plus jitter (`retries`
/// attempts, 5 s overall budget) when the sidecar already exists, i.e.
/// another writer holds the shard. Returns [`LockError::Timeout`] once the
/// retry budget is exhausted.
pub fn acquire_lock(data_path: &Path, retries: u32, initial_delay: Duration) -> Result<LockGuard, LockError> {
    let sidecar_path = lock_sidecar_path(data_path);

    let policy = ExponentialBackoffBuilder::new()
        .with_initial_interval(initial_delay)
        .with_multiplier(1.0)
        .with_max_elapsed_time(Some(Duration::from_secs(5)))
        .build();

    let attempt = std::sync::atomic::AtomicU32::new(0);

    let sidecar = backoff::retry(policy, || {
        let attempt_no = attempt.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
        match OpenOptions::new().write(true).create_new(true).open(&sidecar_path) {
            Ok(file) => Ok(file),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                if attempt_no >= retries {
                    tracing::error!(path = %sidecar_path.display(), attempt_no, "lock acquisition exhausted retries");
                    Err(BackoffError::permanent(err))
                } else {
                    let jitter_ms = rand::thread_rng().gen_range(0..50);
                    std::thread::sleep(Duration::from_millis(jitter_ms));
                    tracing::warn!(path = %sidecar_path.display(), attempt_no, "shard locked, retrying");
                    Err(BackoffError::transient(err))
                }
            }
            Err(err) => Err(BackoffError::permanent(err)),
        }
    })
    .map_err(|_| LockError::Timeout(sidecar_path.clone()))?;

    let data_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .open(data_path)
        .map_err(|source| LockError::Io { path: data_path.to_path_buf(), source })?;
    data_file
        .lock_exclusive()
        .map_err(|source| LockError::Io { path: data_path.to_path_buf(), source })?;

    Ok(LockGuard { sidecar_path, sidecar, data_lock: data_file })
}

impl LockGuard {
    /// The data file, locked for as long as this guard is alive.
    pub fn data_file(&self) -> &File {
        &self.data_lock
    }
}
