//! Command-line interface module.

mod args;
pub mod build;
pub mod clean;
pub mod init;
pub mod watch;

pub use args::{Cli, Commands};

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

/// Runtime for the commands that spawn compilers or watch files.
fn runtime() -> Result<Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to create tokio runtime")
}
