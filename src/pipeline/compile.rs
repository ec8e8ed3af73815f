//! Compile stage and log excerpts.

use std::sync::OnceLock;

use regex::Regex;
use tokio_util::sync::CancellationToken;

use super::{StageError, describe};
use crate::config::BuildConfig;
use crate::core::{BuildError, ProjectPaths};
use crate::debug;
use crate::utils::exec::{Cmd, ExecError, FilterRule};

/// latexmk and TeX engine chatter hidden from `--verbose` output.
static COMPILE_FILTER: FilterRule = FilterRule::new(&[
    "Latexmk:",
    "Rc files read:",
    "This is LuaHBTeX",
    "This is pdfTeX",
    "restricted system commands enabled",
    "Transcript written on",
]);

/// An unterminated error block is cut off after this many lines.
const MAX_BLOCK_LINES: usize = 16;

/// Run the compiler on `<target>.tex` inside `bld/`.
pub(super) async fn compile_document(
    build: &BuildConfig,
    paths: &ProjectPaths,
    cancel: &CancellationToken,
) -> Result<(), StageError> {
    let cmd = Cmd::new(&build.compiler)
        .args(&build.args)
        .arg(paths.tex_file_name())
        .args(&build.extra_args)
        .cwd(paths.build_root())
        .filter(&COMPILE_FILTER);
    debug!("compile"; "{}", cmd.display());

    match cmd.run(cancel).await {
        Ok(_) => Ok(()),
        Err(err) if err.is_cancelled() => Err(StageError::Cancelled),
        Err(ExecError::Failed { output, .. }) => Err(BuildError::Compile {
            log_excerpt: log_excerpt(&output, build.excerpt_lines),
        }
        .into()),
        Err(err) => Err(BuildError::Compile {
            log_excerpt: describe(&err),
        }
        .into()),
    }
}

/// The part of a compiler log worth showing.
///
/// LaTeX reports an error as a block starting with `!` and ending at the
/// `l.<n>` source locator. Every distinct block is kept. Without any block,
/// the last `max_lines` lines are returned instead.
pub fn log_excerpt(output: &str, max_lines: usize) -> String {
    let blocks = error_blocks(output);
    if blocks.is_empty() {
        return tail(output, max_lines.max(1));
    }

    blocks
        .iter()
        .map(|block| block.join("\n"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn error_blocks(output: &str) -> Vec<Vec<&str>> {
    let mut blocks: Vec<Vec<&str>> = Vec::new();
    let mut current: Option<Vec<&str>> = None;

    for line in output.lines() {
        match current.as_mut() {
            Some(block) => {
                block.push(line);
                if is_locator(line) || block.len() >= MAX_BLOCK_LINES {
                    push_unique(&mut blocks, current.take());
                }
            }
            None if line.starts_with('!') => current = Some(vec![line]),
            None => {}
        }
    }
    push_unique(&mut blocks, current);

    blocks
}

// The engine echoes the same error in its log and on the terminal.
fn push_unique<'a>(blocks: &mut Vec<Vec<&'a str>>, block: Option<Vec<&'a str>>) {
    if let Some(block) = block
        && !blocks.contains(&block)
    {
        blocks.push(block);
    }
}

fn is_locator(line: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"^l\.[0-9]+").unwrap());
    re.is_match(line)
}

/// Last `n` non-trailing-blank lines of `output`.
pub(super) fn tail(output: &str, n: usize) -> String {
    let lines: Vec<&str> = output.trim_end().lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
