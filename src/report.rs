//! Turning finished attempts into terminal status.
//!
//! Rendering is pure: the same attempt always renders to the same report,
//! and cancelled attempts render to nothing.

use std::time::Duration;

use crate::core::{AttemptStatus, BuildAttempt, ProjectPaths, Published};
use crate::logger::{status_error, status_success, status_unchanged};

/// Sink for finished attempts. Has no say over the loop.
pub trait Reporter: Send {
    fn report(&mut self, attempt: &BuildAttempt);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Success(String),
    Unchanged(String),
    Failure { summary: String, detail: String },
}

/// What the user should see for `attempt`, if anything.
pub fn render(attempt: &BuildAttempt, paths: &ProjectPaths) -> Option<Report> {
    let artifact = paths.published_artifact();
    let artifact = paths.dirs().relative(&artifact).display();
    let elapsed = format_elapsed(attempt.elapsed().unwrap_or_default());

    match attempt.status() {
        AttemptStatus::Running | AttemptStatus::Cancelled => None,
        AttemptStatus::Succeeded(Published::Replaced) => {
            Some(Report::Success(format!("built {artifact} in {elapsed}")))
        }
        AttemptStatus::Succeeded(Published::Unchanged) => Some(Report::Unchanged(format!(
            "{artifact} unchanged ({elapsed})"
        ))),
        AttemptStatus::Failed(_) => attempt.error_detail().map(|err| Report::Failure {
            summary: format!("{err}, keeping {artifact}"),
            detail: err.detail().trim_end().to_owned(),
        }),
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    if elapsed < Duration::from_secs(1) {
        format!("{}ms", elapsed.as_millis())
    } else {
        format!("{:.1}s", elapsed.as_secs_f64())
    }
}

/// Reports through the overwriting status block.
pub struct StatusReporter {
    paths: ProjectPaths,
}

impl StatusReporter {
    pub fn new(paths: ProjectPaths) -> Self {
        Self { paths }
    }
}

impl Reporter for StatusReporter {
    fn report(&mut self, attempt: &BuildAttempt) {
        match render(attempt, &self.paths) {
            Some(Report::Success(message)) => status_success(&message),
            Some(Report::Unchanged(message)) => status_unchanged(&message),
            Some(Report::Failure { summary, detail }) => status_error(&summary, &detail),
            None => {}
        }
    }
}
