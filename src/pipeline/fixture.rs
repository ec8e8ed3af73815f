//! Throwaway projects where `sh` scripts stand in for rsync and latexmk.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use super::PipelineRunner;
use crate::config::ProjectConfig;
use crate::core::ProjectPaths;

/// "Compiles" by copying the source to the PDF.
pub const COMPILE_OK: &str = r#"cp "$1" "${1%.tex}.pdf""#;

/// Fails like LaTeX does on an undefined macro.
pub const COMPILE_ERROR: &str = "echo 'This is LuaHBTeX'; echo '! Undefined control sequence.'; echo 'l.3 \\foo'; exit 1";

/// Like `COMPILE_OK`, but fails while the document contains `BROKEN`.
pub const COMPILE_CHECKED: &str = r#"if grep -q BROKEN "$1"; then echo '! Undefined control sequence.'; echo 'l.1 BROKEN'; exit 1; fi; cp "$1" "${1%.tex}.pdf""#;

/// Hangs long enough to be cancelled.
pub const COMPILE_SLOW: &str = r#"sleep 30; cp "$1" "${1%.tex}.pdf""#;

pub const DOCUMENT: &str = "\\documentclass{article}\\begin{document}hi\\end{document}\n";

pub struct TestProject {
    dir: TempDir,
    pub config: ProjectConfig,
}

impl TestProject {
    pub fn new(compile_script: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/doc.tex"), DOCUMENT).unwrap();

        let mut config = ProjectConfig {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };
        // Mirrors like `rsync -a --delete`: stale files in bld/ go away.
        config.sync.command = sh(r#"find "$2" -mindepth 1 -delete && cp -R "$1." "$2""#);
        config.build.compiler = "sh".into();
        config.build.args = sh(compile_script).split_off(1);
        config.publish.fsync = false;

        Self { dir, config }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn paths(&self) -> ProjectPaths {
        self.config.project_paths("doc")
    }

    pub fn runner(&self) -> PipelineRunner {
        PipelineRunner::new(self.paths(), &self.config)
    }

    pub fn write_source(&self, name: &str, content: &str) {
        fs::write(self.root().join("src").join(name), content).unwrap();
    }

    pub fn published(&self) -> Option<Vec<u8>> {
        fs::read(self.paths().published_artifact()).ok()
    }
}

/// `sh -c <script> sh`; appended arguments become `$1`, `$2`, ...
pub fn sh(script: &str) -> Vec<String> {
    vec!["sh".into(), "-c".into(), script.into(), "sh".into()]
}
