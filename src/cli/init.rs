//! Project initialization.
//!
//! Creates the project root and its `src/` directory. Running it on an
//! existing project is a no-op.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::core::ProjectDirs;
use crate::log;

/// Create `<root>` and `<root>/src` if they are missing.
pub fn init_project(dirs: &ProjectDirs) -> Result<()> {
    for dir in [dirs.root(), dirs.source_root()] {
        create_dir(dirs, dir)?;
    }
    log!("init"; "put your sources in {}", dirs.relative(dirs.source_root()).display());
    Ok(())
}

fn create_dir(dirs: &ProjectDirs, dir: &Path) -> Result<()> {
    if dir.is_dir() {
        crate::debug!("init"; "{} exists", dir.display());
        return Ok(());
    }
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    log!("init"; "created {}", display_name(dirs, dir));
    Ok(())
}

fn display_name(dirs: &ProjectDirs, dir: &Path) -> String {
    if dir == dirs.root() {
        dir.display().to_string()
    } else {
        dirs.relative(dir).display().to_string()
    }
}
