//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! compiler = "latexmk"
//! args = ["-halt-on-error", "-interaction=nonstopmode", "-pdflatex=lualatex", "-pdf"]
//! extra_args = ["-shell-escape"]   # appended after the document
//! output_name = "thesis"           # dst/thesis.pdf instead of dst/<document>.pdf
//! output_ext = "pdf"
//! excerpt_lines = 20               # log tail shown when no LaTeX error block is found
//! ```

use serde::{Deserialize, Serialize};

/// Compiler invocation and artifact naming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Compiler executable, looked up in PATH.
    pub compiler: String,

    /// Arguments placed before the document name.
    pub args: Vec<String>,

    /// Arguments placed after the document name (`--opts` appends here).
    pub extra_args: Vec<String>,

    /// Published artifact stem. Defaults to the document name.
    pub output_name: Option<String>,

    /// Extension of the artifact the compiler writes.
    pub output_ext: String,

    pub excerpt_lines: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compiler: "latexmk".into(),
            args: vec![
                "-halt-on-error".into(),
                "-interaction=nonstopmode".into(),
                "-pdflatex=lualatex".into(),
                "-pdf".into(),
            ],
            extra_args: Vec::new(),
            output_name: None,
            output_ext: "pdf".into(),
            excerpt_lines: 20,
        }
    }
}
