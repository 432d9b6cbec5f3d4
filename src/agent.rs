//! Agent runtime
//!
//! Wires the dispatcher and the sweeper onto a single event loop. Both
//! producers of upload attempts are multiplexed on one task: each dispatcher
//! event and each full sweep runs to completion before the next handler
//! starts, so the two can never race to deliver or delete the same file, and
//! the counters need no locking. Watcher notifications that arrive during a
//! sweep queue in the channel and are drained afterwards; a burst defers
//! retries, it never drops events.

use std::sync::Arc;

use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::AgentConfig;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::quota::QuotaEnforcer;
use crate::registry::WatchRegistry;
use crate::report::FailureReport;
use crate::sweeper::Sweeper;
use crate::transport::Transport;
use crate::uploader::Uploader;

/// Capacity of the watcher-to-dispatcher channel. When full, the watcher
/// thread blocks, deferring event delivery rather than dropping it.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// The assembled upload lifecycle manager.
pub struct Agent {
    registry: Arc<WatchRegistry>,
    dispatcher: Dispatcher,
    sweeper: Sweeper,
    quota: QuotaEnforcer,
    retry_interval: std::time::Duration,
}

impl Agent {
    /// Assemble the agent from validated configuration and a transport.
    ///
    /// Scans the uploads root to build the registry; an unreadable root is
    /// fatal here, before any watching or uploading starts.
    pub fn new(config: &AgentConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let registry = Arc::new(WatchRegistry::initialize(&config.uploads_root)?);
        if registry.is_empty() {
            warn!(
                "No subdirectories under {}; nothing will be uploaded until restart",
                config.uploads_root.display()
            );
        }
        for dir in registry.iter() {
            info!("Watching {} as '{}'", dir.absolute_path.display(), dir.name);
        }

        let uploader = Arc::new(Uploader::new(
            transport,
            config.node_id.clone(),
            config.build_id.clone(),
        ));
        let dispatcher = Dispatcher::new(Arc::clone(&registry), Arc::clone(&uploader));
        let sweeper = Sweeper::new(
            Arc::clone(&registry),
            Arc::clone(&uploader),
            config.retry_interval(),
        );
        let report = FailureReport::new(config.failure_report_path.clone());
        let quota = QuotaEnforcer::new(config.quota_bytes, Arc::clone(&registry), report);

        Ok(Self {
            registry,
            dispatcher,
            sweeper,
            quota,
            retry_interval: config.retry_interval(),
        })
    }

    /// Run until the watcher backend dies. Never returns in normal operation.
    pub async fn run(mut self) -> Result<()> {
        let (tx, mut rx) = mpsc::channel::<notify::Event>(EVENT_CHANNEL_CAPACITY);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            match res {
                // blocking_send: the watcher runs on its own thread, and a
                // full channel must stall it, not drop the event
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(e) => error!("Watch backend error: {}", e),
            }
        })?;
        for dir in self.registry.iter() {
            watcher.watch(&dir.absolute_path, RecursiveMode::NonRecursive)?;
        }

        // First sweep runs immediately: files left over from a previous run
        // are already old enough to retry
        self.sweep_once().await;

        let sweep_timer = tokio::time::sleep(self.retry_interval);
        tokio::pin!(sweep_timer);

        loop {
            tokio::select! {
                maybe_event = rx.recv() => {
                    match maybe_event {
                        Some(event) => {
                            for file_event in self.dispatcher.classify(&event) {
                                self.dispatcher.handle(file_event).await;
                            }
                        }
                        None => {
                            error!("Watcher channel closed; shutting down");
                            return Ok(());
                        }
                    }
                }
                () = &mut sweep_timer => {
                    self.sweep_once().await;
                    // Reschedule one full interval after completion, so a
                    // long sweep never overlaps or back-to-backs the next one
                    sweep_timer
                        .as_mut()
                        .reset(tokio::time::Instant::now() + self.retry_interval);
                }
            }
        }
    }

    async fn sweep_once(&mut self) {
        let stats = self.sweeper.sweep(&mut self.quota).await;
        info!(
            "Sweep complete: {} scanned, {} retried, {} delivered, {} evicted",
            stats.scanned, stats.retried, stats.delivered, stats.evicted
        );
    }
}
