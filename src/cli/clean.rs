//! Removing generated directories.
//!
//! `clean` deletes `bld/` and `dst/` without touching `src/`. Removal keeps
//! going past entries it cannot delete, so one locked file does not leave the
//! rest of the tree behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

use crate::core::ProjectDirs;
use crate::log;

/// Paths that could not be removed, with the reason.
pub type CleanErrors = Vec<(PathBuf, io::Error)>;

/// Delete `bld/` and `dst/`, logging each failure and a summary.
pub fn clean_project(dirs: &ProjectDirs) -> Result<()> {
    let mut errors = CleanErrors::new();

    for dir in [dirs.build_root(), dirs.dest_root()] {
        let name = dirs.relative(dir).display();
        if fs::symlink_metadata(dir).is_err() {
            log!("clean"; "{} already removed", name);
            continue;
        }

        let before = errors.len();
        remove_tree(dir, &mut errors);
        if errors.len() == before {
            log!("clean"; "removed {}", name);
        }
    }

    if errors.is_empty() {
        return Ok(());
    }
    for (path, err) in &errors {
        log!("error"; "{}: {}", dirs.relative(path).display(), err);
    }
    bail!("clean finished with {} error(s)", errors.len())
}

/// Depth-first removal that records failures instead of stopping at them.
fn remove_tree(path: &Path, errors: &mut CleanErrors) {
    let meta = match fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) => return errors.push((path.to_path_buf(), e)),
    };

    if !meta.is_dir() {
        if let Err(e) = fs::remove_file(path) {
            errors.push((path.to_path_buf(), e));
        }
        return;
    }

    match fs::read_dir(path) {
        Ok(entries) => {
            for entry in entries {
                match entry {
                    Ok(entry) => remove_tree(&entry.path(), errors),
                    Err(e) => errors.push((path.to_path_buf(), e)),
                }
            }
        }
        Err(e) => return errors.push((path.to_path_buf(), e)),
    }

    if let Err(e) = fs::remove_dir(path) {
        errors.push((path.to_path_buf(), e));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> (TempDir, ProjectDirs) {
        let dir = TempDir::new().unwrap();
        let dirs = ProjectDirs::new(dir.path().to_path_buf());
        fs::create_dir_all(dirs.source_root()).unwrap();
        fs::write(dirs.source_root().join("doc.tex"), "x").unwrap();
        (dir, dirs)
    }

    #[test]
    fn test_clean_removes_generated_dirs_only() {
        let (_dir, dirs) = project();
        fs::create_dir_all(dirs.build_root().join("figures/nested")).unwrap();
        fs::write(dirs.build_root().join("figures/nested/a.pdf"), "a").unwrap();
        fs::write(dirs.build_root().join("doc.aux"), "aux").unwrap();
        fs::create_dir_all(dirs.dest_root()).unwrap();
        fs::write(dirs.dest_root().join("doc.pdf"), "pdf").unwrap();

        clean_project(&dirs).unwrap();

        assert!(!dirs.build_root().exists());
        assert!(!dirs.dest_root().exists());
        assert!(dirs.source_root().join("doc.tex").is_file());
    }

    #[test]
    fn test_clean_missing_dirs_is_ok() {
        let (_dir, dirs) = project();

        clean_project(&dirs).unwrap();
        clean_project(&dirs).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_clean_removes_symlinks_not_their_targets() {
        let (_dir, dirs) = project();
        fs::create_dir_all(dirs.build_root()).unwrap();
        std::os::unix::fs::symlink(dirs.source_root(), dirs.build_root().join("src-link")).unwrap();

        clean_project(&dirs).unwrap();

        assert!(!dirs.build_root().exists());
        assert!(dirs.source_root().join("doc.tex").is_file());
    }

    #[test]
    fn test_remove_tree_records_missing_path() {
        let dir = TempDir::new().unwrap();
        let mut errors = CleanErrors::new();

        remove_tree(&dir.path().join("nope"), &mut errors);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].1.kind(), io::ErrorKind::NotFound);
    }
}
