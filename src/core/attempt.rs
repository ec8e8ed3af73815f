//! Build triggers and attempts.

use std::fmt;
use std::time::{Duration, Instant};

use super::BuildError;

/// "A build should run now."
///
/// Carries only a sequence number, assigned where the trigger is created.
/// Higher numbers supersede lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildTrigger {
    seq: u64,
}

impl BuildTrigger {
    /// Sequence number of the build that runs at startup.
    pub const INITIAL_SEQ: u64 = 0;

    pub const fn new(seq: u64) -> Self {
        Self { seq }
    }

    /// Trigger for the build that runs before any change was seen.
    pub const fn initial() -> Self {
        Self::new(Self::INITIAL_SEQ)
    }

    pub const fn seq(self) -> u64 {
        self.seq
    }

    pub fn supersedes(self, other: Self) -> bool {
        self.seq > other.seq
    }
}

impl fmt::Display for BuildTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.seq)
    }
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Sync,
    Compile,
    Publish,
}

impl Stage {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sync => "sync",
            Self::Compile => "compile",
            Self::Publish => "publish",
        }
    }
}

/// What a successful publish did to the artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Published {
    /// New content was renamed into place.
    Replaced,
    /// Output was byte-identical; the existing file was kept.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    Running,
    Succeeded(Published),
    Failed(BuildError),
    Cancelled,
}

/// One run of the pipeline.
#[derive(Debug, Clone)]
pub struct BuildAttempt {
    sequence_id: u64,
    stage: Stage,
    status: AttemptStatus,
    started: Instant,
    elapsed: Option<Duration>,
}

impl BuildAttempt {
    /// Begin an attempt for `trigger`, at the first stage.
    pub fn start(trigger: BuildTrigger) -> Self {
        Self {
            sequence_id: trigger.seq(),
            stage: Stage::Sync,
            status: AttemptStatus::Running,
            started: Instant::now(),
            elapsed: None,
        }
    }

    pub fn sequence_id(&self) -> u64 {
        self.sequence_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn status(&self) -> &AttemptStatus {
        &self.status
    }

    /// Present iff the attempt failed.
    pub fn error_detail(&self) -> Option<&BuildError> {
        match &self.status {
            AttemptStatus::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Wall time from start to termination (`None` while running).
    pub fn elapsed(&self) -> Option<Duration> {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        matches!(self.status, AttemptStatus::Running)
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.status, AttemptStatus::Succeeded(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.status, AttemptStatus::Cancelled)
    }

    /// Move to the next stage. Stages only advance.
    pub(crate) fn enter(&mut self, stage: Stage) {
        debug_assert!(self.is_running(), "attempt already terminated");
        debug_assert!(stage >= self.stage, "stages only advance");
        self.stage = stage;
    }

    pub(crate) fn succeed(&mut self, published: Published) {
        self.finish(AttemptStatus::Succeeded(published));
    }

    pub(crate) fn fail(&mut self, error: BuildError) {
        if self.is_running() {
            self.stage = error.stage();
        }
        self.finish(AttemptStatus::Failed(error));
    }

    pub(crate) fn cancel(&mut self) {
        self.finish(AttemptStatus::Cancelled);
    }

    fn finish(&mut self, status: AttemptStatus) {
        if self.is_running() {
            self.status = status;
            self.elapsed = Some(self.started.elapsed());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_ordering() {
        let t1 = BuildTrigger::new(1);
        let t2 = BuildTrigger::new(2);
        assert!(t2.supersedes(t1));
        assert!(!t1.supersedes(t2));
        assert!(!t1.supersedes(t1));
        assert!(t1.supersedes(BuildTrigger::initial()));
    }

    #[test]
    fn test_attempt_lifecycle() {
        let mut attempt = BuildAttempt::start(BuildTrigger::new(3));
        assert_eq!(attempt.sequence_id(), 3);
        assert_eq!(attempt.stage(), Stage::Sync);
        assert!(attempt.is_running());
        assert!(attempt.elapsed().is_none());

        attempt.enter(Stage::Compile);
        attempt.enter(Stage::Publish);
        attempt.succeed(Published::Replaced);

        assert!(attempt.succeeded());
        assert_eq!(attempt.stage(), Stage::Publish);
        assert!(attempt.error_detail().is_none());
        assert!(attempt.elapsed().is_some());
    }

    #[test]
    fn test_error_detail_iff_failed() {
        let mut attempt = BuildAttempt::start(BuildTrigger::new(1));
        attempt.enter(Stage::Compile);
        attempt.fail(BuildError::Compile {
            log_excerpt: "! Undefined control sequence.".into(),
        });

        assert_eq!(attempt.stage(), Stage::Compile);
        assert!(matches!(
            attempt.error_detail(),
            Some(BuildError::Compile { .. })
        ));

        let mut cancelled = BuildAttempt::start(BuildTrigger::new(2));
        cancelled.cancel();
        assert!(cancelled.is_cancelled());
        assert!(cancelled.error_detail().is_none());
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut attempt = BuildAttempt::start(BuildTrigger::new(1));
        attempt.cancel();
        attempt.fail(BuildError::sync("late"));
        assert!(attempt.is_cancelled());
    }
}
