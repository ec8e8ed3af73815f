//! Project directory layout.
//!
//! ```text
//! <root>/
//!   ├ src/  user-owned sources (required)
//!   ├ bld/  sources are mirrored here, the compiler runs here
//!   └ dst/  the last good artifact is published here
//! ```

use std::path::{Path, PathBuf};

const SOURCE_DIR: &str = "src";
const BUILD_DIR: &str = "bld";
const DEST_DIR: &str = "dst";

/// The three tool directories under a project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDirs {
    root: PathBuf,
    source_root: PathBuf,
    build_root: PathBuf,
    dest_root: PathBuf,
}

impl ProjectDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            source_root: root.join(SOURCE_DIR),
            build_root: root.join(BUILD_DIR),
            dest_root: root.join(DEST_DIR),
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Path relative to the project root, for display.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Everything one build needs to know about where things live.
///
/// Immutable once constructed; cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    dirs: ProjectDirs,
    /// Document stem inside `src/`, without extension.
    target_name: String,
    /// Stem of the published artifact in `dst/`.
    output_name: String,
    /// Artifact extension produced by the compiler.
    artifact_ext: String,
}

impl ProjectPaths {
    pub fn new(
        dirs: ProjectDirs,
        target_name: impl Into<String>,
        output_name: Option<String>,
        artifact_ext: impl Into<String>,
    ) -> Self {
        let target_name = strip_tex_ext(&target_name.into()).to_owned();
        let output_name = output_name.unwrap_or_else(|| target_name.clone());
        Self {
            dirs,
            target_name,
            output_name,
            artifact_ext: artifact_ext.into(),
        }
    }

    pub fn dirs(&self) -> &ProjectDirs {
        &self.dirs
    }

    pub fn source_root(&self) -> &Path {
        self.dirs.source_root()
    }

    pub fn build_root(&self) -> &Path {
        self.dirs.build_root()
    }

    pub fn dest_root(&self) -> &Path {
        self.dirs.dest_root()
    }

    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Main document as seen by the user: `src/<target>.tex`.
    pub fn source_document(&self) -> PathBuf {
        self.source_root().join(self.tex_file_name())
    }

    /// File name handed to the compiler inside `bld/`.
    pub fn tex_file_name(&self) -> String {
        format!("{}.tex", self.target_name())
    }

    /// Artifact as written by the compiler: `bld/<target>.<ext>`.
    pub fn compiled_artifact(&self) -> PathBuf {
        self.build_root()
            .join(format!("{}.{}", self.target_name(), self.artifact_ext))
    }

    /// Artifact as seen by viewers: `dst/<output>.<ext>`.
    pub fn published_artifact(&self) -> PathBuf {
        self.dest_root()
            .join(format!("{}.{}", self.output_name(), self.artifact_ext))
    }
}

/// Users habitually tab-complete `thesis.tex`; accept it.
fn strip_tex_ext(name: &str) -> &str {
    name.strip_suffix(".tex").unwrap_or(name)
}
