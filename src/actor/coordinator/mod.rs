//! Actor Coordinator - wires the watcher to the loop controller
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates the trigger channel
//! - Attaches the watcher before anything is built
//! - Runs the loop controller until shutdown or a watcher failure

mod controller;


pub use controller::LoopController;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::fs::FsActor;
use super::messages::WatchMsg;
use crate::core::BuildTrigger;
use crate::pipeline::PipelineRunner;
use crate::report::Reporter;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs loop mode.
pub struct Coordinator {
    runner: Arc<PipelineRunner>,
    debounce: Duration,
    shutdown: CancellationToken,
}

impl Coordinator {
    pub fn new(runner: PipelineRunner, debounce: Duration) -> Self {
        Self {
            runner: Arc::new(runner),
            debounce,
            shutdown: CancellationToken::new(),
        }
    }

    /// Set shutdown token.
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Run loop mode: initial build, then one build per debounced change.
    pub async fn run<R: Reporter>(self, reporter: R) -> Result<()> {
        let (tx, rx) = mpsc::channel::<WatchMsg>(CHANNEL_BUFFER);

        let source_root = self.runner.paths().source_root().to_path_buf();
        let fs_actor = FsActor::new(source_root.clone(), self.debounce, tx)
            .map_err(|e| anyhow!("watcher failed on `{}`: {}", source_root.display(), e))?;
        let fs_handle = tokio::spawn(fs_actor.run());

        crate::log!(
            "watch";
            "watching {} (quiet window {:?}, Ctrl+C to stop)",
            self.runner.paths().dirs().relative(&source_root).display(),
            self.debounce
        );

        let mut controller = LoopController::new(self.runner, reporter, self.shutdown);
        let result = controller.run(rx, Some(BuildTrigger::initial())).await;

        fs_handle.abort();
        crate::debug!("watch"; "stopped");
        result.map_err(Into::into)
    }
}
