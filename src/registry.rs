//! Watched-directory registry
//!
//! Built once at startup by scanning the immediate children of the uploads
//! root. The registry is immutable for the process lifetime: a subdirectory
//! created while the agent is running is not picked up until restart. Entry
//! order is directory-scan order and doubles as the addressing scheme for
//! watch identifiers and eviction counters.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// One monitored subdirectory of the uploads root.
///
/// `name` is the subdirectory's relative name; it travels with every upload
/// as the `directory` tag and keys the eviction counter table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedDirectory {
    /// Relative name under the uploads root
    pub name: String,
    /// Absolute path, resolved once at startup
    pub absolute_path: PathBuf,
}

/// Immutable set of watched directories.
#[derive(Debug)]
pub struct WatchRegistry {
    directories: Vec<WatchedDirectory>,
}

impl WatchRegistry {
    /// Scan `root` and register every visible subdirectory.
    ///
    /// Hidden entries (leading `.`) are skipped; non-directory entries are
    /// skipped. An unreadable root is a fatal startup error.
    pub fn initialize(root: &Path) -> Result<Self> {
        let mut directories = Vec::new();
        for entry in fs::read_dir(root)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with('.') {
                continue;
            }
            let absolute_path = root.join(name.as_ref());
            // stat, not lstat: a symlink to a directory counts
            if !fs::metadata(&absolute_path)?.is_dir() {
                continue;
            }
            directories.push(WatchedDirectory {
                name: name.into_owned(),
                absolute_path,
            });
        }
        Ok(Self { directories })
    }

    /// Build a registry from explicit entries (tests, pre-resolved config).
    pub fn from_directories(directories: Vec<WatchedDirectory>) -> Self {
        Self { directories }
    }

    pub fn get(&self, index: usize) -> Option<&WatchedDirectory> {
        self.directories.get(index)
    }

    /// Resolve a watched directory from the absolute path of one of its
    /// entries, as reported by the filesystem watcher.
    pub fn find_by_parent(&self, file_path: &Path) -> Option<(usize, &WatchedDirectory)> {
        let parent = file_path.parent()?;
        self.directories
            .iter()
            .enumerate()
            .find(|(_, dir)| dir.absolute_path == parent)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WatchedDirectory> {
        self.directories.iter()
    }

    pub fn len(&self) -> usize {
        self.directories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}
