//! Agent configuration
//!
//! Plain-value surface consumed by the core: collector URL, uploads root,
//! retry interval, quota budget, identity strings, TLS toggle, and the
//! eviction-report path. Loaded from a TOML file; the binary layers CLI and
//! environment overrides on top. Every validation failure here is fatal at
//! startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Result, UplinkError};

fn default_upload_url() -> String {
    "https://collector.example.net:8001/upload/".to_string()
}

fn default_uploads_root() -> PathBuf {
    PathBuf::from("/var/spool/uplink")
}

fn default_retry_interval_minutes() -> u64 {
    30
}

fn default_quota_bytes() -> u64 {
    // 100 MiB of pending data across all watched directories
    100 * 1024 * 1024
}

fn default_build_id() -> String {
    crate::VERSION.to_string()
}

fn default_verify_tls() -> bool {
    true
}

fn default_failure_report_path() -> PathBuf {
    PathBuf::from("/var/spool/uplink/.failures.tab")
}

/// Full agent configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Base URL the file body is PUT against
    #[serde(default = "default_upload_url")]
    pub upload_url: String,
    /// Root directory whose subdirectories are watched
    #[serde(default = "default_uploads_root")]
    pub uploads_root: PathBuf,
    /// Age threshold and sweep period, in minutes
    #[serde(default = "default_retry_interval_minutes")]
    pub retry_interval_minutes: u64,
    /// Maximum total bytes of pending files before eviction
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,
    /// Node identity sent with every upload
    #[serde(default)]
    pub node_id: String,
    /// Build identifier sent with every upload
    #[serde(default = "default_build_id")]
    pub build_id: String,
    /// Verify the collector's TLS certificate
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    /// Where the eviction-counter table is written
    #[serde(default = "default_failure_report_path")]
    pub failure_report_path: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            upload_url: default_upload_url(),
            uploads_root: default_uploads_root(),
            retry_interval_minutes: default_retry_interval_minutes(),
            quota_bytes: default_quota_bytes(),
            node_id: String::new(),
            build_id: default_build_id(),
            verify_tls: default_verify_tls(),
            failure_report_path: default_failure_report_path(),
        }
    }
}

impl AgentConfig {
    /// Load from a TOML file. Missing keys take their defaults; unknown keys
    /// are rejected.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Reject configurations the agent cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.upload_url.is_empty() {
            return Err(UplinkError::Config("upload_url must not be empty".into()));
        }
        if self.retry_interval_minutes == 0 {
            return Err(UplinkError::Config(
                "retry_interval_minutes must be at least 1".into(),
            ));
        }
        if self.quota_bytes == 0 {
            return Err(UplinkError::Config("quota_bytes must be non-zero".into()));
        }
        if self.node_id.is_empty() {
            return Err(UplinkError::Config(
                "node_id must be set (directly or via an identity file)".into(),
            ));
        }
        Ok(())
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_minutes * 60)
    }
}

/// Read a node identity from a file: first line, trimmed.
///
/// An unreadable or empty identity file is a fatal startup error.
pub fn read_node_id(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| UplinkError::Identity(format!("{}: {}", path.display(), e)))?;
    let id = contents.lines().next().unwrap_or("").trim();
    if id.is_empty() {
        return Err(UplinkError::Identity(format!(
            "{}: identity file is empty",
            path.display()
        )));
    }
    Ok(id.to_string())
}
