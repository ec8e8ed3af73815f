//! Build pipeline for one attempt.
//!
//! ```text
//! src/ ──sync──▶ bld/ ──compile──▶ bld/<target>.pdf ──publish──▶ dst/<output>.pdf
//! ```
//!
//! Each stage either completes, fails with a typed [`BuildError`], or is
//! cancelled. The first non-completion aborts the attempt, so a failure at
//! Sync or Compile never reaches `dst/`.

mod compile;
mod publish;
mod sync;

#[cfg(test)]
pub(crate) mod fixture;
#[cfg(test)]
mod tests;

use publish::publish_artifact;
use sync::sync_sources;

use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::config::{BuildConfig, ProjectConfig, PublishConfig, SyncConfig};
use crate::core::{BuildAttempt, BuildError, BuildTrigger, ProjectPaths, Published, Stage};
use crate::debug;
use crate::utils::exec::ExecError;

/// Why a stage did not complete.
#[derive(Debug)]
pub enum StageError {
    /// A newer trigger or shutdown stopped the attempt. Not a failure.
    Cancelled,
    Failed(BuildError),
}

impl From<BuildError> for StageError {
    fn from(err: BuildError) -> Self {
        Self::Failed(err)
    }
}

/// Runs sync, compile and publish for a fixed document.
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    paths: ProjectPaths,
    sync: SyncConfig,
    build: BuildConfig,
    publish: PublishConfig,
}

impl PipelineRunner {
    pub fn new(paths: ProjectPaths, config: &ProjectConfig) -> Self {
        Self {
            paths,
            sync: config.sync.clone(),
            build: config.build.clone(),
            publish: config.publish.clone(),
        }
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    /// Run one attempt to a terminal status.
    ///
    /// Cancelling `cancel` terminates the running subprocess; the attempt
    /// then ends `Cancelled` and never publishes.
    pub async fn run(&self, trigger: BuildTrigger, cancel: CancellationToken) -> BuildAttempt {
        let mut attempt = BuildAttempt::start(trigger);

        match self.stages(&mut attempt, &cancel).await {
            Ok(published) => attempt.succeed(published),
            Err(StageError::Cancelled) => attempt.cancel(),
            Err(StageError::Failed(err)) => attempt.fail(err),
        }

        debug!(
            "build";
            "{} finished at {} as {:?} after {:?}",
            trigger,
            attempt.stage().label(),
            attempt.status(),
            attempt.elapsed().unwrap_or_default()
        );
        attempt
    }

    /// Only run the Sync stage (`copy` command).
    pub async fn sync_only(&self, cancel: &CancellationToken) -> Result<(), StageError> {
        sync_sources(&self.sync.command, &self.paths, cancel).await
    }

    async fn stages(
        &self,
        attempt: &mut BuildAttempt,
        cancel: &CancellationToken,
    ) -> Result<Published, StageError> {
        let start = Instant::now();
        attempt.enter(Stage::Sync);
        sync_sources(&self.sync.command, &self.paths, cancel).await?;
        debug!("sync"; "done in {:?}", start.elapsed());

        let start = Instant::now();
        attempt.enter(Stage::Compile);
        compile::compile_document(&self.build, &self.paths, cancel).await?;
        debug!("compile"; "done in {:?}", start.elapsed());

        // Last chance to drop out: once the rename starts it runs to the end.
        if cancel.is_cancelled() {
            return Err(StageError::Cancelled);
        }

        attempt.enter(Stage::Publish);
        let paths = self.paths.clone();
        let config = self.publish.clone();
        let published = tokio::task::spawn_blocking(move || publish_artifact(&paths, &config))
            .await
            .map_err(|e| BuildError::publish(format!("publish task failed: {e}")))??;
        Ok(published)
    }
}

/// Convert a subprocess error into a stage outcome.
///
/// `failed` builds the stage's `BuildError` from a readable description.
fn exec_outcome(err: ExecError, failed: impl FnOnce(String) -> BuildError) -> StageError {
    if err.is_cancelled() {
        return StageError::Cancelled;
    }
    StageError::Failed(failed(describe(&err)))
}

fn describe(err: &ExecError) -> String {
    match err {
        ExecError::Failed { output, .. } if !output.trim().is_empty() => {
            format!("{err}\n{}", compile::tail(output, TAIL_LINES))
        }
        _ => match std::error::Error::source(err) {
            Some(source) => format!("{err}: {source}"),
            None => err.to_string(),
        },
    }
}

/// Output lines kept when a non-compiler tool fails.
const TAIL_LINES: usize = 20;
