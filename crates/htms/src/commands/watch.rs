//! Watch command.

use std::path::Path;

use anyhow::{Context, Result};
use htms_core::paths::normalize;
use htms_watch::{FileWatcher, Rebuilder};

use super::BuildArgs;

/// Build once, then rebuild on every change until interrupted.
pub async fn run(args: BuildArgs, project: &Path) -> Result<()> {
    let config = super::build::build_config(args, project)?;
    let rebuilder = Rebuilder::new(config.clone());

    // A broken initial build still leaves us watching so it can be fixed.
    if let Some(Ok(report)) = rebuilder.trigger().await {
        tracing::info!("Output: {}", report.output_dir.display());
    }

    let mut paths = vec![normalize(&config.input_dir)];
    if let Some(source) = &config.config_source {
        paths.push(normalize(source));
    }
    let ignored = [normalize(&config.output_dir)];

    let (watcher, events) =
        FileWatcher::new(&paths, &ignored).context("Failed to start file watcher")?;

    tracing::info!("Watching {} for changes", config.input_dir.display());

    tokio::select! {
        _ = rebuilder.run(events) => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for Ctrl-C")?;
            tracing::info!("Stopping");
        }
    }

    drop(watcher);
    Ok(())
}
