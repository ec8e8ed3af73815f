//! FileSystem Actor
//!
//! Watches the source root and sends debounced build triggers to the loop
//! controller. Implements the "Watcher-First" pattern for zero event loss.
//!
//! Architecture:
//! ```text
//! notify (std thread) → ChangeEvent → Debouncer (pure timing) → WatchMsg::Trigger
//! ```

use std::path::PathBuf;
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::messages::WatchMsg;
use crate::core::{BuildTrigger, WatcherFatalError};

// Pure timing and deduplication.
mod debouncer;
// Shared fs event types.
mod types;

#[cfg(test)]
mod tests;

use debouncer::Debouncer;
use types::{ChangeEvent, ChangeKind};

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    watcher: RecommendedWatcher,
    /// Directory being watched, recursively
    root: PathBuf,
    /// Channel to the loop controller
    tx: mpsc::Sender<WatchMsg>,
    /// Debouncer state
    debouncer: Debouncer,
}

impl FsActor {
    /// Create a new FsActor with Watcher-First pattern
    ///
    /// The watcher starts immediately, buffering events while the caller
    /// performs the initial build. Fails if `root` does not exist.
    pub fn new(root: PathBuf, quiet: Duration, tx: mpsc::Sender<WatchMsg>) -> notify::Result<Self> {
        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        // Directories created later are covered by the recursive watch.
        watcher.watch(&root, RecursiveMode::Recursive)?;

        Ok(Self {
            notify_rx,
            watcher,
            root,
            tx,
            // The initial build owns the initial sequence number.
            debouncer: Debouncer::new(quiet, BuildTrigger::INITIAL_SEQ + 1),
        })
    }

    /// Run the actor event loop until the receiver goes away or the root
    /// disappears. Dropping the watcher releases the OS watch handles.
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let tx = self.tx;
        let root = self.root;
        let mut debouncer = self.debouncer;
        let _watcher = self.watcher;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Spawn a thread to poll notify events and send to async channel
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => {
                    let Some(event) = event else {
                        let _ = tx.send(WatchMsg::Fatal(WatcherFatalError::new("file watcher stopped"))).await;
                        break;
                    };
                    for change in ChangeEvent::from_notify(&event, Instant::now()) {
                        debouncer.add(change);
                    }
                }
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    if !root.is_dir() {
                        let reason = format!("`{}` was removed", root.display());
                        let _ = tx.send(WatchMsg::Fatal(WatcherFatalError::new(reason))).await;
                        break;
                    }

                    let Some((trigger, changes)) = debouncer.take_trigger(Instant::now()) else {
                        continue;
                    };
                    log_changes(&root, trigger, &changes);
                    if tx.send(WatchMsg::Trigger(trigger)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

fn log_changes(root: &std::path::Path, trigger: BuildTrigger, changes: &[(PathBuf, ChangeKind)]) {
    crate::debug_do! {
        for (path, kind) in changes {
            let path = path.strip_prefix(root).unwrap_or(path);
            crate::logger::log("watch", &format!("{} {}", kind.label(), path.display()));
        }
    }

    let Some((first, _)) = changes.first() else {
        return;
    };
    let first = first.strip_prefix(root).unwrap_or(first).display();
    match changes.len() {
        1 => crate::log!("watch"; "{} changed, rebuilding ({})", first, trigger),
        n => crate::log!("watch"; "{} and {} more changed, rebuilding ({})", first, n - 1, trigger),
    }
}
