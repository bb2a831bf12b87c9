//! Shared application state for the dashboard server.

use std::sync::Arc;

use autovote_runner::{
    run_vote, BrowserOptions, LogBroadcast, LogSink, RunConfig, RunSummary, ScopedLog, SiteStore,
    Timings,
};
use futures::future::BoxFuture;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Starts one run and resolves when it is over.
pub type Launcher = Arc<
    dyn Fn(RunConfig, ScopedLog) -> BoxFuture<'static, autovote_runner::Result<RunSummary>>
        + Send
        + Sync,
>;

/// Launcher that drives a fresh browser per run.
pub fn browser_launcher(options: BrowserOptions) -> Launcher {
    Arc::new(move |config: RunConfig, log: ScopedLog| -> BoxFuture<'static, _> {
        let options = options.clone();
        Box::pin(async move {
            let timings = Timings {
                close_delay_ms: if options.headless { 0 } else { 3000 },
                ..config.timings
            };
            let config = config.timings(timings);
            run_vote(&config, &options, &log).await
        })
    })
}

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Saved sites, written through to disk on every change.
    pub sites: Arc<Mutex<SiteStore>>,
    /// Fan-out of run progress to `/api/logs` clients.
    pub log: LogBroadcast,
    launcher: Launcher,
}

impl AppState {
    pub fn new(sites: SiteStore, log: LogBroadcast, launcher: Launcher) -> Self {
        Self {
            sites: Arc::new(Mutex::new(sites)),
            log,
            launcher,
        }
    }

    /// Start a run in the background. Its progress goes to the log broadcast,
    /// tagged with the identifier.
    pub fn spawn_run(&self, config: RunConfig) {
        let log = self.log.scoped(config.identifier.clone());
        let launch = self.launcher.clone();
        tokio::spawn(async move {
            info!(run = %log.run(), "run started");
            match launch(config, log.clone()).await {
                Ok(summary) => info!(
                    run = %log.run(),
                    iterations = summary.iterations,
                    reason = ?summary.reason,
                    "run finished"
                ),
                Err(e) => {
                    warn!(run = %log.run(), error = %e, "run failed");
                    log.emit(&format!("Fatal Error: {}", e));
                }
            }
        });
    }
}
