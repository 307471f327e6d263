//! Rebuild scheduling.

use tokio::sync::mpsc::Receiver;

use htms_build::{BuildConfig, BuildError, BuildReport, SiteBuilder};

use crate::latch::{BuildGuard, BuildLatch};
use crate::watcher::WatchEvent;

/// Runs builds in response to watch events, one at a time.
#[derive(Debug, Clone)]
pub struct Rebuilder {
    config: BuildConfig,
    latch: BuildLatch,
}

impl Rebuilder {
    /// Create a new rebuilder.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            latch: BuildLatch::new(),
        }
    }

    pub fn latch(&self) -> &BuildLatch {
        &self.latch
    }

    /// Run a full build unless one is already in flight.
    ///
    /// Returns `None` when the request was dropped.
    pub async fn trigger(&self) -> Option<Result<BuildReport, BuildError>> {
        let guard = self.latch.try_begin()?;
        Some(self.build(guard).await)
    }

    /// Rebuild on every event until the channel closes.
    ///
    /// Each build runs in its own task so events keep draining; events that
    /// arrive while a build is running are dropped.
    pub async fn run(self, mut events: Receiver<WatchEvent>) {
        while let Some(event) = events.recv().await {
            let Some(guard) = self.latch.try_begin() else {
                tracing::debug!("Build in progress, dropping {}", event);
                continue;
            };

            tracing::info!("{}", event);
            let rebuilder = self.clone();
            tokio::spawn(async move {
                let _ = rebuilder.build(guard).await;
            });
        }
    }

    /// Configuration is resolved again on every build.
    async fn build(&self, _guard: BuildGuard) -> Result<BuildReport, BuildError> {
        let result = SiteBuilder::new(self.config.clone()).build().await;
        match &result {
            Ok(report) if report.is_success() => {
                tracing::info!("Rebuilt in {}ms", report.duration_ms);
            }
            Ok(report) => {
                tracing::warn!("Rebuilt with {} failed files", report.failures.len());
            }
            Err(e) => tracing::error!("Rebuild failed: {}", e),
        }
        result
    }
}
