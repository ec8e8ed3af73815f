//! `[sync]` section configuration.
//!
//! ```toml
//! [sync]
//! command = ["rsync", "-a", "--delete", "--filter=P /*.aux", ...]   # "<src>/" and "<bld>" are appended
//! ```
//!
//! `--delete` alone would wipe latexmk's auxiliary files and the previous
//! PDF from `bld/` on every sync, forcing full rebuilds. The default command
//! protects the compiler's top-level outputs instead. The cost: a file of one
//! of these types removed from the top of `src/` lingers in `bld/` until
//! `clean`.

use serde::{Deserialize, Serialize};

/// Top-level files in `bld/` written by latexmk and friends.
const PROTECTED_OUTPUTS: &[&str] = &[
    "*.aux",
    "*.bbl",
    "*.bcf",
    "*.blg",
    "*.fdb_latexmk",
    "*.fls",
    "*.lof",
    "*.log",
    "*.lot",
    "*.out",
    "*.pdf",
    "*.run.xml",
    "*.synctex.gz",
    "*.toc",
    "*.xdv",
];

/// How `src/` is mirrored into `bld/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Command array; source and destination are appended.
    pub command: Vec<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let mut command: Vec<String> = vec!["rsync".into(), "-a".into(), "--delete".into()];
        command.extend(
            PROTECTED_OUTPUTS
                .iter()
                .map(|pattern| format!("--filter=P /{pattern}")),
        );
        Self { command }
    }
}

impl SyncConfig {
    pub fn program(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }
}
