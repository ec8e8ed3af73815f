//! Absolute, symlink-free paths.
//!
//! notify reports paths below the canonical watch root while users type
//! relative ones, so both sides go through [`normalize_path`] before they are
//! compared.

use std::path::{Path, PathBuf};

/// Absolute form of `path` with symlinks resolved.
///
/// A path that no longer exists (a removed file) keeps its missing tail on
/// top of the deepest ancestor that can still be canonicalized.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    };

    if let Ok(canonical) = absolute.canonicalize() {
        return canonical;
    }

    let mut missing = Vec::new();
    let mut current = absolute.as_path();
    while let (Some(parent), Some(name)) = (current.parent(), current.file_name()) {
        missing.push(name);
        if let Ok(base) = parent.canonicalize() {
            return missing.iter().rev().fold(base, |acc, name| acc.join(name));
        }
        current = parent;
    }
    absolute
}

/// Command-line `path`: taken from cwd when it exists there, else from `base`.
pub fn resolve_path(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        normalize_path(path)
    } else {
        normalize_path(&base.join(path))
    }
}
