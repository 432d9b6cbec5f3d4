//! Event-driven dispatch
//!
//! Translates raw filesystem notifications into upload attempts. Only
//! move-into events matter: producers are expected to write elsewhere and
//! rename into a watched directory, so a completed rename is the signal that
//! a file is whole. Files created in place are never observed here; the
//! periodic sweep picks them up by age instead.

use std::path::PathBuf;
use std::sync::Arc;

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};
use tracing::{debug, info};

use crate::registry::WatchRegistry;
use crate::uploader::{UploadOutcome, Uploader};

/// One "file became available" notification resolved against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEvent {
    /// Registry index of the watched directory the file landed in
    pub dir_index: usize,
    /// Absolute path of the file
    pub path: PathBuf,
}

/// Consumes watcher notifications and triggers immediate upload attempts.
pub struct Dispatcher {
    registry: Arc<WatchRegistry>,
    uploader: Arc<Uploader>,
}

impl Dispatcher {
    pub fn new(registry: Arc<WatchRegistry>, uploader: Arc<Uploader>) -> Self {
        Self { registry, uploader }
    }

    /// Filter a raw notification down to the move-into events that name a
    /// watched directory. Everything else (creations in place, data writes,
    /// rename-from halves, paths outside the registry) is dropped.
    pub fn classify(&self, event: &Event) -> Vec<FileEvent> {
        if !matches!(
            event.kind,
            EventKind::Modify(ModifyKind::Name(RenameMode::To))
        ) {
            return Vec::new();
        }
        event
            .paths
            .iter()
            .filter_map(|path| match self.registry.find_by_parent(path) {
                Some((dir_index, _)) => Some(FileEvent {
                    dir_index,
                    path: path.clone(),
                }),
                None => {
                    debug!("Ignoring event outside watched set: {}", path.display());
                    None
                }
            })
            .collect()
    }

    /// Attempt delivery for one event, synchronously with respect to the
    /// event loop. A failure here is final for this event; the file stays
    /// resident and becomes sweep-eligible once its age passes the retry
    /// interval.
    pub async fn handle(&self, event: FileEvent) -> UploadOutcome {
        let Some(dir) = self.registry.get(event.dir_index) else {
            return UploadOutcome::Failed;
        };
        info!("File move detected: {}", event.path.display());
        self.uploader.attempt(&event.path, &dir.name).await
    }
}
