//! Core types - pure abstractions shared across the codebase.

mod attempt;
mod error;
mod paths;
mod state;

pub use attempt::{AttemptStatus, BuildAttempt, BuildTrigger, Published, Stage};
pub use error::{BuildError, SetupError, WatcherFatalError};
pub use paths::{ProjectDirs, ProjectPaths};
pub use state::{is_shutdown, setup_shutdown_handler, shutdown_token};
