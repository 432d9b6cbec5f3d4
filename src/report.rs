//! Eviction report sink
//!
//! Externalizes the per-directory eviction counters as a small textual table
//! at a well-known path, one `name<TAB>count` line per watched directory. The
//! table is rewritten in full after any sweep that evicted at least one file,
//! via temp-file-and-rename so readers never observe a torn table.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::PathBuf;

use crate::error::Result;
use crate::registry::WatchRegistry;

/// Writes the eviction-counter table.
#[derive(Debug, Clone)]
pub struct FailureReport {
    path: PathBuf,
}

impl FailureReport {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Rewrite the full table. `counters` is indexed by registry order.
    pub fn write(&self, registry: &WatchRegistry, counters: &[u64]) -> Result<()> {
        let mut table = String::new();
        for (idx, dir) in registry.iter().enumerate() {
            let count = counters.get(idx).copied().unwrap_or(0);
            // Infallible for String, but keeps the write explicit
            let _ = writeln!(table, "{}\t{}", dir.name, count);
        }

        let parent = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(table.as_bytes())?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::WatchedDirectory;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn registry(names: &[&str]) -> WatchRegistry {
        WatchRegistry::from_directories(
            names
                .iter()
                .map(|n| WatchedDirectory {
                    name: (*n).to_string(),
                    absolute_path: PathBuf::from("/uploads").join(n),
                })
                .collect(),
        )
    }

    #[test]
    fn writes_one_line_per_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.tab");
        let report = FailureReport::new(path.clone());

        report.write(&registry(&["passive", "active"]), &[3, 0]).unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "passive\t3\nactive\t0\n"
        );
    }

    #[test]
    fn rewrites_replace_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("failures.tab");
        let report = FailureReport::new(path.clone());
        let reg = registry(&["passive"]);

        report.write(&reg, &[1]).unwrap();
        report.write(&reg, &[2]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "passive\t2\n");
    }
}
