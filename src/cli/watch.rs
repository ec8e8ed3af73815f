//! Loop mode: rebuild whenever the sources settle.

use anyhow::Result;

use super::build::warn_missing_document;
use super::runtime;
use crate::actor::Coordinator;
use crate::config::ProjectConfig;
use crate::core::shutdown_token;
use crate::log;
use crate::pipeline::PipelineRunner;
use crate::report::StatusReporter;

/// Build `document`, then rebuild after every debounced change until Ctrl+C.
///
/// Returns an error when the watcher cannot start or stops working.
pub fn watch_loop(config: &ProjectConfig, document: &str) -> Result<()> {
    config.validate(true)?;

    let paths = config.project_paths(document);
    warn_missing_document(&paths);
    let runner = PipelineRunner::new(paths.clone(), config);

    let coordinator =
        Coordinator::new(runner, config.watch.debounce()).with_shutdown(shutdown_token());
    runtime()?.block_on(coordinator.run(StatusReporter::new(paths)))?;

    log!("watch"; "stopped");
    Ok(())
}
