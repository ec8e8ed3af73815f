//! Publish stage: atomically replace the artifact in `dst/`.
//!
//! The new file is written next to its destination and renamed over it, so
//! a viewer watching `dst/` sees either the old or the new artifact, never a
//! partial one.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use crate::config::PublishConfig;
use crate::core::{BuildError, ProjectPaths, Published};
use crate::debug;
use crate::utils::hash::{file_digest, same_content};

/// Copy `bld/<target>.<ext>` to `dst/<output>.<ext>`.
///
/// A byte-identical artifact is left alone (`Published::Unchanged`), so
/// viewers do not reload for nothing.
pub fn publish_artifact(
    paths: &ProjectPaths,
    config: &PublishConfig,
) -> Result<Published, BuildError> {
    let dirs = paths.dirs();
    let compiled = paths.compiled_artifact();
    let target = paths.published_artifact();

    if !compiled.is_file() {
        return Err(BuildError::publish(format!(
            "compiler produced no `{}`",
            dirs.relative(&compiled).display()
        )));
    }

    let dest_root = paths.dest_root();
    fs::create_dir_all(dest_root).map_err(|e| io_error("create", dest_root, &e))?;

    if same_content(&compiled, &target) {
        debug!("publish"; "{} unchanged", dirs.relative(&target).display());
        return Ok(Published::Unchanged);
    }

    let mut source = File::open(&compiled).map_err(|e| io_error("open", &compiled, &e))?;
    let mut staged = tempfile::Builder::new()
        .prefix(".texbuild-")
        .suffix(".part")
        .tempfile_in(dest_root)
        .map_err(|e| io_error("stage into", dest_root, &e))?;

    io::copy(&mut source, staged.as_file_mut()).map_err(|e| io_error("copy", &compiled, &e))?;
    if config.fsync {
        staged
            .as_file()
            .sync_all()
            .map_err(|e| io_error("flush", staged.path(), &e))?;
    }

    // Temp files are created 0600; viewers may run as someone else.
    if let Err(e) = source
        .metadata()
        .and_then(|meta| staged.as_file().set_permissions(meta.permissions()))
    {
        debug!("publish"; "keeping default permissions on {}: {}", staged.path().display(), e);
    }

    staged
        .persist(&target)
        .map_err(|e| io_error("rename onto", &target, &e.error))?;

    debug!(
        "publish";
        "{} {}",
        dirs.relative(&target).display(),
        file_digest(&target).map(|d| d.to_string()).unwrap_or_default()
    );
    Ok(Published::Replaced)
}

fn io_error(action: &str, path: &Path, err: &io::Error) -> BuildError {
    BuildError::publish(format!("cannot {action} `{}`: {err}", path.display()))
}
