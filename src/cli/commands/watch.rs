//! Live tracking of a library directory.

use crossbeam_channel::{Receiver, RecvTimeoutError};
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::{info, warn};

use super::{OutputFormat, identify, library_cache};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::report::{ConsolePresenter, JsonPresenter, Presenter};
use crate::scanner::{self, FileWatcher, WatchEvent};
use crate::service::{TrackerHandle, TrackerService};

/// Scan `path`, then keep the warnings current until Ctrl+C.
pub fn cmd_watch(rt: &Runtime, config: &Config, path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    // Start watching before the scan so nothing slips in between
    let (watcher, rx) = watch_library(path, config)?;

    rt.block_on(async {
        let presenter: Box<dyn Presenter> = match format {
            OutputFormat::Text => Box::new(ConsolePresenter::stdout(config.report.max_visible_rows)),
            OutputFormat::Json => Box::new(JsonPresenter::stdout()),
        };
        let (service, handle) = TrackerService::new(library_cache(config), &config.tracker, presenter);
        let tracker_task = tokio::spawn(service.run());

        let mut files = std::pin::pin!(scanner::scan(path.to_path_buf()));
        let mut count = 0usize;
        while let Some(file) = files.next().await {
            if add_file(&handle, &file, config) {
                count += 1;
            }
        }
        info!(target: "cli::watch", files = count, path = %path.display(), "Initial scan complete");
        eprintln!("Watching {} for changes. Press Ctrl+C to stop.", path.display());

        let stop = Arc::new(AtomicBool::new(false));
        let bridge_stop = Arc::clone(&stop);
        let bridge = handle.clone();
        let bridge_config = config.clone();
        let bridge_task = tokio::task::spawn_blocking(move || {
            while !bridge_stop.load(Ordering::Relaxed) {
                let event = match rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => break,
                };
                let delivered = match event {
                    WatchEvent::Created(file) | WatchEvent::Modified(file) => {
                        add_file(&bridge, &file, &bridge_config);
                        true
                    }
                    WatchEvent::Removed(file) => bridge.file_removed(file),
                    WatchEvent::DirCreated(dir) => {
                        for file in scanner::scan_dir(&dir) {
                            add_file(&bridge, &file, &bridge_config);
                        }
                        true
                    }
                    WatchEvent::Error(e) => {
                        warn!(target: "cli::watch", error = %e, "Watcher reported an error");
                        true
                    }
                };
                if !delivered {
                    break;
                }
            }
        });

        tokio::signal::ctrl_c().await?;
        info!(target: "cli::watch", "Stopping");

        stop.store(true, Ordering::Relaxed);
        drop(watcher);
        let _ = bridge_task.await;
        handle.shutdown();
        let tracker = tracker_task.await?;
        info!(target: "cli::watch", warnings = tracker.visible_set().len(), "Watch finished");
        Ok::<(), anyhow::Error>(())
    })
}

fn watch_library(path: &Path, config: &Config) -> Result<(FileWatcher, Receiver<WatchEvent>)> {
    if !path.is_dir() {
        return Err(Error::not_found(path));
    }
    Ok(FileWatcher::new(vec![path.to_path_buf()], config.tracker.debounce())?)
}

/// Attach one file to its album. Returns whether it had an album identity.
fn add_file(handle: &TrackerHandle, path: &Path, config: &Config) -> bool {
    let Some(identity) = identify(path, config) else {
        return false;
    };
    handle.file_added(identity.album_id, path.to_path_buf(), Some(identity.display_name));
    true
}
