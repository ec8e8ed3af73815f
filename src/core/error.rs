//! Error taxonomy.
//!
//! | Error               | Scope        | Effect                              |
//! |---------------------|--------------|-------------------------------------|
//! | `SetupError`        | process      | fatal, exit non-zero                |
//! | `BuildError`        | one attempt  | reported, artifact kept, loop goes on |
//! | `WatcherFatalError` | watch loop   | terminates loop mode                |
//!
//! A cancelled attempt is not an error and has no type here.

use std::path::PathBuf;

use thiserror::Error;

use super::Stage;

/// Problems that make it pointless to start building at all.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("source directory `{0}` does not exist (run `texbuild <ROOT> init`)")]
    MissingSource(PathBuf),

    #[error("required tool `{tool}` not found in PATH (needed for {purpose})")]
    MissingTool { tool: String, purpose: &'static str },

    #[error("`{0}` command is empty")]
    EmptyCommand(&'static str),
}

/// Per-attempt failure. The previous artifact is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("sync failed")]
    Sync { detail: String },

    #[error("compile failed")]
    Compile { log_excerpt: String },

    #[error("publish failed")]
    Publish { detail: String },
}

impl BuildError {
    pub fn sync(detail: impl Into<String>) -> Self {
        Self::Sync {
            detail: detail.into(),
        }
    }

    pub fn publish(detail: impl Into<String>) -> Self {
        Self::Publish {
            detail: detail.into(),
        }
    }

    /// Stage the attempt was in when it failed.
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Sync { .. } => Stage::Sync,
            Self::Compile { .. } => Stage::Compile,
            Self::Publish { .. } => Stage::Publish,
        }
    }

    /// Text shown under the failure summary.
    pub fn detail(&self) -> &str {
        match self {
            Self::Sync { detail } | Self::Publish { detail } => detail,
            Self::Compile { log_excerpt } => log_excerpt,
        }
    }
}

/// The watched tree went away; loop mode cannot continue.
#[derive(Debug, Error)]
#[error("stopped watching: {reason}")]
pub struct WatcherFatalError {
    pub reason: String,
}

impl WatcherFatalError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_stage() {
        assert_eq!(BuildError::sync("x").stage(), Stage::Sync);
        assert_eq!(
            BuildError::Compile {
                log_excerpt: String::new()
            }
            .stage(),
            Stage::Compile
        );
        assert_eq!(BuildError::publish("x").stage(), Stage::Publish);
    }

    #[test]
    fn test_build_error_detail() {
        let err = BuildError::Compile {
            log_excerpt: "! Missing $ inserted.".into(),
        };
        assert_eq!(err.to_string(), "compile failed");
        assert_eq!(err.detail(), "! Missing $ inserted.");
    }

    #[test]
    fn test_setup_error_message() {
        let err = SetupError::MissingTool {
            tool: "latexmk".into(),
            purpose: "compiling",
        };
        assert!(err.to_string().contains("latexmk"));
        assert!(err.to_string().contains("compiling"));
    }
}
