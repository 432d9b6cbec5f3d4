//! Uplink agent daemon
//!
//! Loads configuration, builds the HTTP transport, and runs the upload
//! lifecycle manager until the process is stopped. All startup failures exit
//! non-zero before any watching or uploading begins.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use uplink::config::{read_node_id, AgentConfig};
use uplink::transport::HttpTransport;
use uplink::Agent;

#[derive(Parser)]
#[command(name = "uplink-agent")]
#[command(about = "Resident agent that ships local files to a remote collector")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(long, env = "UPLINK_CONFIG")]
    config: Option<String>,

    /// Override: collector base URL
    #[arg(long, env = "UPLINK_UPLOAD_URL")]
    upload_url: Option<String>,

    /// Override: uploads root directory
    #[arg(long, env = "UPLINK_UPLOADS_ROOT")]
    uploads_root: Option<PathBuf>,

    /// Override: retry interval in minutes
    #[arg(long)]
    retry_interval_minutes: Option<u64>,

    /// Override: pending-bytes budget
    #[arg(long)]
    quota_bytes: Option<u64>,

    /// Override: node identity string
    #[arg(long, env = "UPLINK_NODE_ID")]
    node_id: Option<String>,

    /// Read the node identity from a file (first line, trimmed)
    #[arg(long, env = "UPLINK_NODE_ID_FILE")]
    node_id_file: Option<PathBuf>,

    /// Override: build identifier
    #[arg(long)]
    build_id: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long)]
    insecure: bool,

    /// Override: eviction-report path
    #[arg(long)]
    failure_report_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let path = shellexpand::tilde(path).to_string();
            AgentConfig::from_toml_file(std::path::Path::new(&path))
                .with_context(|| format!("loading configuration from {path}"))?
        }
        None => AgentConfig::default(),
    };

    if let Some(url) = cli.upload_url {
        config.upload_url = url;
    }
    if let Some(root) = cli.uploads_root {
        config.uploads_root = root;
    }
    if let Some(minutes) = cli.retry_interval_minutes {
        config.retry_interval_minutes = minutes;
    }
    if let Some(bytes) = cli.quota_bytes {
        config.quota_bytes = bytes;
    }
    if let Some(node_id) = cli.node_id {
        config.node_id = node_id;
    } else if let Some(id_file) = &cli.node_id_file {
        config.node_id = read_node_id(id_file).context("reading node identity")?;
    }
    if let Some(build_id) = cli.build_id {
        config.build_id = build_id;
    }
    if cli.insecure {
        config.verify_tls = false;
    }
    if let Some(path) = cli.failure_report_path {
        config.failure_report_path = path;
    }

    config.validate().context("invalid configuration")?;

    tracing::info!(
        "uplink-agent {} starting: node {}, root {}, collector {}",
        uplink::VERSION,
        config.node_id,
        config.uploads_root.display(),
        config.upload_url
    );

    let transport = Arc::new(
        HttpTransport::new(config.upload_url.clone(), config.verify_tls)
            .context("initializing transport")?,
    );
    let agent = Agent::new(&config, transport).context("initializing agent")?;
    agent.run().await.context("agent terminated")?;
    Ok(())
}
