//! Property-based tests for quota enforcement
//!
//! Random pending-file populations must always satisfy the retention bound:
//! after enforcement, everything strictly newer than the eviction cut-off
//! fits in the budget, counters only ever grow, and files are only removed
//! when the population actually exceeded the budget.

use std::path::Path;
use std::sync::Arc;

use proptest::prelude::*;

use uplink::quota::{PendingFile, QuotaEnforcer};
use uplink::registry::{WatchRegistry, WatchedDirectory};
use uplink::report::FailureReport;

fn registry_of(dir_count: usize, under: &Path) -> Arc<WatchRegistry> {
    Arc::new(WatchRegistry::from_directories(
        (0..dir_count)
            .map(|i| WatchedDirectory {
                name: format!("dir{i}"),
                absolute_path: under.join(format!("dir{i}")),
            })
            .collect(),
    ))
}

#[derive(Debug, Clone)]
struct SpecFile {
    age_marker: i64,
    size_bytes: u64,
    dir_index: usize,
}

fn spec_file(dir_count: usize) -> impl Strategy<Value = SpecFile> {
    (0i64..10_000, 0u64..4096, 0..dir_count).prop_map(|(age_marker, size_bytes, dir_index)| {
        SpecFile {
            age_marker,
            size_bytes,
            dir_index,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn retained_set_respects_the_budget(
        files in proptest::collection::vec(spec_file(3), 0..24),
        budget in 0u64..16_384,
    ) {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_of(3, tmp.path());
        let report = FailureReport::new(tmp.path().join("failures.tab"));
        let mut quota = QuotaEnforcer::new(budget, registry, report);

        let mut snapshot = Vec::new();
        for (i, f) in files.iter().enumerate() {
            let path = tmp.path().join(format!("f{i}"));
            std::fs::File::create(&path).unwrap();
            snapshot.push(PendingFile {
                path,
                age_marker: f.age_marker,
                size_bytes: f.size_bytes,
                dir_index: f.dir_index,
            });
        }
        let total: u64 = files.iter().map(|f| f.size_bytes).sum();

        let evicted = quota.enforce(snapshot.clone());

        // Survivors are exactly the files still on disk; they must fit in
        // the budget, and everything evicted must be no newer than every
        // survivor (newest-first retention)
        let survivors: Vec<&PendingFile> =
            snapshot.iter().filter(|f| f.path.exists()).collect();
        let retained: u64 = survivors.iter().map(|f| f.size_bytes).sum();
        prop_assert!(retained <= budget, "retained {} > budget {}", retained, budget);

        if total <= budget {
            prop_assert_eq!(evicted, 0, "within budget, nothing is lost");
        }

        let oldest_survivor = survivors.iter().map(|f| f.age_marker).min();
        for gone in snapshot.iter().filter(|f| !f.path.exists()) {
            if let Some(oldest) = oldest_survivor {
                prop_assert!(gone.age_marker <= oldest);
            }
        }

        // Counters account for every eviction, attributed per directory
        let counted: u64 = quota.counters().iter().sum();
        prop_assert_eq!(counted, evicted as u64);
    }

    #[test]
    fn counters_are_monotonic_across_enforcements(
        first in proptest::collection::vec(spec_file(2), 0..12),
        second in proptest::collection::vec(spec_file(2), 0..12),
        budget in 0u64..2048,
    ) {
        let tmp = tempfile::tempdir().unwrap();
        let registry = registry_of(2, tmp.path());
        let report = FailureReport::new(tmp.path().join("failures.tab"));
        let mut quota = QuotaEnforcer::new(budget, registry, report);

        let mut build = |files: &[SpecFile], tag: &str| {
            files
                .iter()
                .enumerate()
                .map(|(i, f)| {
                    let path = tmp.path().join(format!("{tag}{i}"));
                    std::fs::File::create(&path).unwrap();
                    PendingFile {
                        path,
                        age_marker: f.age_marker,
                        size_bytes: f.size_bytes,
                        dir_index: f.dir_index,
                    }
                })
                .collect::<Vec<_>>()
        };

        quota.enforce(build(&first, "a"));
        let after_first = quota.counters().to_vec();
        quota.enforce(build(&second, "b"));
        let after_second = quota.counters().to_vec();

        for (before, after) in after_first.iter().zip(after_second.iter()) {
            prop_assert!(after >= before);
        }
    }
}
