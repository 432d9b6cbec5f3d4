//! Quota enforcement
//!
//! The one place the agent intentionally discards data. Given the sweep's
//! snapshot of every pending file, it retains the newest files up to the byte
//! budget and deletes the rest, oldest-first by construction of the sort.
//! Every eviction increments the owning directory's counter; the counters are
//! externalized through the report sink whenever a sweep evicted anything.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::registry::WatchRegistry;
use crate::report::FailureReport;

/// One pending file observed during a sweep.
///
/// Reconstructed fresh from filesystem metadata every sweep; never cached.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub path: PathBuf,
    /// Status-change time (unix seconds); proxy for time-since-arrival
    pub age_marker: i64,
    pub size_bytes: u64,
    /// Registry index of the owning watched directory
    pub dir_index: usize,
}

/// Enforces the pending-bytes budget and owns the eviction counters.
pub struct QuotaEnforcer {
    budget_bytes: u64,
    counters: Vec<u64>,
    registry: Arc<WatchRegistry>,
    report: FailureReport,
}

impl QuotaEnforcer {
    pub fn new(budget_bytes: u64, registry: Arc<WatchRegistry>, report: FailureReport) -> Self {
        let counters = vec![0; registry.len()];
        Self {
            budget_bytes,
            counters,
            registry,
            report,
        }
    }

    /// Apply newest-first retention to a sweep snapshot.
    ///
    /// Sorts by `age_marker` descending, accumulates sizes, and keeps every
    /// file while the running total stays within budget. The file that would
    /// first exceed the budget, and everything older than it, is deleted and
    /// counted. Returns the number of files actually evicted.
    pub fn enforce(&mut self, mut snapshot: Vec<PendingFile>) -> usize {
        // Most recently changed first; stable, so equal timestamps keep
        // their sweep discovery order
        snapshot.sort_by(|a, b| b.age_marker.cmp(&a.age_marker));

        let mut retained_bytes: u64 = 0;
        let mut over_budget = false;
        let mut evicted = 0;
        for file in &snapshot {
            if !over_budget {
                let next = retained_bytes.saturating_add(file.size_bytes);
                if next <= self.budget_bytes {
                    retained_bytes = next;
                    continue;
                }
                over_budget = true;
            }
            // Raced deletions (delivered or removed externally) are skipped
            // and not counted; the counter tracks files this enforcer dropped
            match fs::remove_file(&file.path) {
                Ok(()) => {
                    if let Some(count) = self.counters.get_mut(file.dir_index) {
                        *count += 1;
                    }
                    evicted += 1;
                    info!(
                        "Evicted {} ({} bytes) to stay within {} byte budget",
                        file.path.display(),
                        file.size_bytes,
                        self.budget_bytes
                    );
                }
                Err(e) => {
                    warn!("Failed to evict {}: {}", file.path.display(), e);
                }
            }
        }

        if evicted > 0 {
            if let Err(e) = self.report.write(&self.registry, &self.counters) {
                warn!("Failed to write eviction report: {}", e);
            }
        }
        evicted
    }

    /// Per-directory eviction counters, indexed by registry order.
    pub fn counters(&self) -> &[u64] {
        &self.counters
    }
}
