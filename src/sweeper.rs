//! Periodic retry sweep
//!
//! Rescans every watched directory on a fixed period, retries files old
//! enough to be due, and hands the surviving pending set to the quota
//! enforcer. A file's presence on disk is the only record of "still pending",
//! so the sweep is a full reconstruction from filesystem metadata each time.

use std::fs;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, info, warn};

use crate::quota::{PendingFile, QuotaEnforcer};
use crate::registry::WatchRegistry;
use crate::uploader::{UploadOutcome, Uploader};

/// Outcome totals for one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Files considered across all watched directories
    pub scanned: usize,
    /// Files whose age made them due for a retry
    pub retried: usize,
    /// Retries that delivered (and removed) their file
    pub delivered: usize,
    /// Files the quota enforcer deleted
    pub evicted: usize,
}

/// Drives retry and quota passes over the watched directories.
pub struct Sweeper {
    registry: Arc<WatchRegistry>,
    uploader: Arc<Uploader>,
    retry_interval: Duration,
}

impl Sweeper {
    pub fn new(
        registry: Arc<WatchRegistry>,
        uploader: Arc<Uploader>,
        retry_interval: Duration,
    ) -> Self {
        Self {
            registry,
            uploader,
            retry_interval,
        }
    }

    /// Run one full sweep: retry due files, then enforce the quota on
    /// everything still resident. Per-file and per-directory filesystem
    /// errors are logged and skipped; they never abort the sweep.
    pub async fn sweep(&self, quota: &mut QuotaEnforcer) -> SweepStats {
        let now = unix_now();
        let retry_secs = self.retry_interval.as_secs() as i64;
        let mut stats = SweepStats::default();
        let mut snapshot: Vec<PendingFile> = Vec::new();

        for (dir_index, dir) in self.registry.iter().enumerate() {
            let entries = match fs::read_dir(&dir.absolute_path) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!("Cannot scan {}: {}", dir.absolute_path.display(), e);
                    continue;
                }
            };
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!("Bad entry under {}: {}", dir.absolute_path.display(), e);
                        continue;
                    }
                };
                let path = entry.path();
                // Regular files and symlinks only; directories and special
                // files are never upload candidates
                let file_type = match entry.file_type() {
                    Ok(t) => t,
                    Err(e) => {
                        warn!("Cannot stat {}: {}", path.display(), e);
                        continue;
                    }
                };
                if !file_type.is_file() && !file_type.is_symlink() {
                    continue;
                }
                let meta = match fs::metadata(&path) {
                    Ok(meta) => meta,
                    Err(e) => {
                        // Dangling symlink or raced deletion
                        warn!("Cannot stat {}: {}", path.display(), e);
                        continue;
                    }
                };
                // A symlink must resolve to a regular file to count
                if !meta.is_file() {
                    continue;
                }

                stats.scanned += 1;
                let age_marker = age_marker(&meta);
                if now - age_marker > retry_secs {
                    info!("Retrying file {}", path.display());
                    stats.retried += 1;
                    if self.uploader.attempt(&path, &dir.name).await == UploadOutcome::Delivered {
                        stats.delivered += 1;
                        continue;
                    }
                } else {
                    debug!("Not yet due: {}", path.display());
                }
                snapshot.push(PendingFile {
                    path,
                    age_marker,
                    size_bytes: meta.len(),
                    dir_index,
                });
            }
        }

        stats.evicted = quota.enforce(snapshot);
        stats
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Status-change time of a file, in unix seconds.
///
/// ctime is updated whenever the file is modified or moved, so it is a lower
/// bound on the time since the file landed in the uploads directory. Failed
/// upload attempts do not touch metadata, so the marker survives retries.
#[cfg(unix)]
fn age_marker(meta: &fs::Metadata) -> i64 {
    use std::os::unix::fs::MetadataExt;
    meta.ctime()
}

#[cfg(not(unix))]
fn age_marker(meta: &fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
