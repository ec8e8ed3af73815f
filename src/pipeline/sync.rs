//! Sync stage: mirror `src/` into `bld/`.

use std::ffi::OsString;
use std::fs;

use tokio_util::sync::CancellationToken;

use super::{StageError, exec_outcome};
use crate::core::{BuildError, ProjectPaths};
use crate::debug;
use crate::utils::exec::{Cmd, FilterRule};

static SYNC_FILTER: FilterRule = FilterRule::new(&["sending incremental file list", "sent ", "total size"]);

/// Run the sync command with `<src>/` and `<bld>` appended.
///
/// The trailing slash makes rsync copy the contents of `src/`, not the
/// directory itself. `bld/` is created first.
pub async fn sync_sources(
    command: &[String],
    paths: &ProjectPaths,
    cancel: &CancellationToken,
) -> Result<(), StageError> {
    if command.is_empty() {
        return Err(BuildError::sync("sync command is empty").into());
    }

    let build_root = paths.build_root();
    fs::create_dir_all(build_root).map_err(|e| {
        BuildError::sync(format!("cannot create `{}`: {e}", build_root.display()))
    })?;

    let mut source = OsString::from(paths.source_root());
    source.push("/");

    let cmd = Cmd::from_slice(command)
        .arg(source)
        .arg(build_root)
        .filter(&SYNC_FILTER);
    debug!("sync"; "{}", cmd.display());

    cmd.run(cancel)
        .await
        .map(|_| ())
        .map_err(|err| exec_outcome(err, |detail| BuildError::sync(detail)))
}
