//! Uplink - resident upload agent
//!
//! Ships files produced by other local processes to a remote collector over
//! HTTP, tolerating transient network failure and bounded local disk
//! pressure. The filesystem is the only queue: a file sitting under a
//! watched directory is pending, an absent file is delivered or evicted.

pub mod agent;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod quota;
pub mod registry;
pub mod report;
pub mod sweeper;
pub mod transport;
pub mod uploader;

pub use agent::Agent;
pub use config::AgentConfig;
pub use error::{Result, UplinkError};
pub use registry::{WatchRegistry, WatchedDirectory};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
