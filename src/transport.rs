//! Collector transport
//!
//! The one network round trip the agent performs: PUT the file body against
//! the collector base URL, with the request metadata carried as individually
//! percent-encoded query parameters.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{Result, UplinkError};

/// Request metadata attached to every upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTags {
    /// Full path of the file as observed locally
    pub filename: String,
    /// Node identity string
    pub node_id: String,
    /// Build/version identifier of the producing agent
    pub build_id: String,
    /// Originating watched-directory name
    pub directory: String,
}

/// Seam between the upload lifecycle and the network.
///
/// One call is one delivery attempt; an `Err` means the file was not accepted
/// and must stay on disk. Implementations are expected to have bounded
/// timeouts of their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn upload(&self, path: &Path, tags: &UploadTags) -> Result<()>;
}

/// HTTP transport backed by a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build the transport. Client construction failure is fatal at startup.
    pub fn new(base_url: impl Into<String>, verify_tls: bool) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if !verify_tls {
            builder = builder.danger_accept_invalid_certs(true);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn upload(&self, path: &Path, tags: &UploadTags) -> Result<()> {
        let body = tokio::fs::read(path).await?;
        let response = self
            .client
            .put(&self.base_url)
            .query(&[
                ("filename", tags.filename.as_str()),
                ("node_id", tags.node_id.as_str()),
                ("build_id", tags.build_id.as_str()),
                ("directory", tags.directory.as_str()),
            ])
            .body(body)
            .send()
            .await?;

        // An HTTP error status is a rejection, not a delivery
        let status = response.status();
        if !status.is_success() {
            return Err(UplinkError::Rejected(status));
        }
        Ok(())
    }
}
