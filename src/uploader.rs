//! Single upload attempt
//!
//! Exactly one delivery attempt for one file. On success the local file is
//! deleted here, as a side effect of the same call; on failure the file is
//! left untouched and no retry state is recorded. Retry timing is entirely
//! age-based and owned by the sweeper.

use std::path::Path;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::transport::{Transport, UploadTags};

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Transfer accepted by the collector; local file removed
    Delivered,
    /// Transfer failed or was rejected; local file untouched
    Failed,
}

/// Performs upload attempts on behalf of the dispatcher and the sweeper.
pub struct Uploader {
    transport: Arc<dyn Transport>,
    node_id: String,
    build_id: String,
}

impl Uploader {
    pub fn new(transport: Arc<dyn Transport>, node_id: String, build_id: String) -> Self {
        Self {
            transport,
            node_id,
            build_id,
        }
    }

    /// Attempt delivery of `path`, tagged with its originating directory.
    ///
    /// Never returns an error: every failure mode here is transient by
    /// contract and resolves to `Failed`, leaving the file for a later sweep.
    /// A path that vanished between discovery and attempt (raced by a
    /// concurrent delivery or external deletion) also resolves to `Failed`
    /// without touching anything else.
    pub async fn attempt(&self, path: &Path, directory_name: &str) -> UploadOutcome {
        let size_bytes = match tokio::fs::metadata(path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                return UploadOutcome::Failed;
            }
        };

        let tags = UploadTags {
            filename: path.to_string_lossy().into_owned(),
            node_id: self.node_id.clone(),
            build_id: self.build_id.clone(),
            directory: directory_name.to_string(),
        };

        match self.transport.upload(path, &tags).await {
            Ok(()) => {
                info!(
                    "Uploaded {} ({} bytes) from {}",
                    path.display(),
                    size_bytes,
                    directory_name
                );
                // The transfer already succeeded, so a failed unlink loses no
                // data; it only leaves disk unreclaimed.
                if let Err(e) = tokio::fs::remove_file(path).await {
                    warn!(
                        "Uploaded file not garbage collected: {}: {}",
                        path.display(),
                        e
                    );
                }
                UploadOutcome::Delivered
            }
            Err(e) => {
                error!("Failed to upload {}: {}", path.display(), e);
                UploadOutcome::Failed
            }
        }
    }
}
