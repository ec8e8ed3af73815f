//! One-shot commands: `once` and `copy`.

use std::sync::Arc;

use anyhow::{Result, anyhow};

use super::runtime;
use crate::actor::LoopController;
use crate::config::ProjectConfig;
use crate::core::{BuildTrigger, ProjectPaths, is_shutdown, shutdown_token};
use crate::log;
use crate::pipeline::{PipelineRunner, StageError};
use crate::report::StatusReporter;

/// Build `document` once and report the outcome.
///
/// Returns whether the attempt succeeded. Setup problems (missing `src/`,
/// missing tools) are errors; a failed build is not.
pub fn build_once(config: &ProjectConfig, document: &str) -> Result<bool> {
    config.validate(true)?;

    let paths = config.project_paths(document);
    warn_missing_document(&paths);
    let runner = Arc::new(PipelineRunner::new(paths.clone(), config));
    let mut controller = LoopController::new(runner, StatusReporter::new(paths), shutdown_token());

    let attempt = runtime()?.block_on(controller.run_once(BuildTrigger::initial()));
    if attempt.is_cancelled() && is_shutdown() {
        log!("build"; "interrupted");
    }
    Ok(attempt.succeeded())
}

/// Mirror `src/` into `bld/` without compiling.
pub fn copy_sources(config: &ProjectConfig) -> Result<()> {
    config.validate(false)?;

    // Only the directories matter for a sync.
    let paths = config.project_paths("");
    let runner = PipelineRunner::new(paths, config);
    let dirs = config.dirs();

    match runtime()?.block_on(runner.sync_only(&shutdown_token())) {
        Ok(()) => {
            log!(
                "sync";
                "copied {} to {}",
                dirs.relative(dirs.source_root()).display(),
                dirs.relative(dirs.build_root()).display()
            );
            Ok(())
        }
        Err(StageError::Cancelled) => {
            log!("sync"; "interrupted");
            Ok(())
        }
        Err(StageError::Failed(err)) => Err(anyhow!("{}\n{}", err, err.detail().trim_end())),
    }
}

/// The compiler will fail anyway; say why before it does.
pub(super) fn warn_missing_document(paths: &ProjectPaths) {
    let document = paths.source_document();
    if !document.is_file() {
        log!(
            "warning";
            "{} does not exist",
            paths.dirs().relative(&document).display()
        );
    }
}
