//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` / `debug_do!` for output gated behind `--verbose`
//! - `WatchStatus` for the build result block in loop mode
//!
//! # Example
//!
//! ```ignore
//! log!("sync"; "copying {} to {}", src, bld);
//! debug!("compile"; "finished in {:?}", elapsed);
//! status_error("build failed", &excerpt);
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::LazyLock,
    sync::atomic::{AtomicBool, Ordering},
    time::SystemTime,
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Execute code only when --verbose is enabled
///
/// Use this to avoid computing expensive debug data when not needed.
#[macro_export]
macro_rules! debug_do {
    ($($body:tt)*) => {{
        if $crate::logger::is_verbose() {
            $($body)*
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let module_lower = module.to_ascii_lowercase();
    let prefix = colorize_prefix(module, &module_lower);

    // Plain log lines sit between status blocks; never overwrite them.
    WATCH_STATUS.lock().detach();

    let mut stdout = stdout().lock();
    execute!(stdout, Clear(ClearType::UntilNewLine)).ok();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str, module_lower: &str) -> String {
    let prefix = format!("[{module}]");
    match module_lower {
        "sync" | "compile" | "publish" => prefix.bright_blue().bold().to_string(),
        "watch" | "loop" => prefix.bright_green().bold().to_string(),
        "error" => prefix.bright_red().bold().to_string(),
        _ => prefix.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Watch Status (status block with overwrite)
// ============================================================================

/// Wall-clock `HH:MM:SS` (UTC) of `at`.
fn clock(at: SystemTime) -> String {
    let secs = at
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!(
        "{:02}:{:02}:{:02}",
        (secs / 3600) % 24,
        (secs / 60) % 60,
        secs % 60
    )
}

/// Glyph in front of a status block.
#[derive(Debug, Clone, Copy)]
enum Mark {
    Success,
    Unchanged,
    Failure,
}

impl Mark {
    fn paint(self) -> Option<String> {
        match self {
            Self::Success => Some("✓".green().to_string()),
            Self::Failure => Some("✗".red().to_string()),
            Self::Unchanged => None,
        }
    }
}

/// Status display for build results.
///
/// Each block overwrites the previous one, so a fixed error replaces its own
/// failure report instead of scrolling it away.
///
/// ```ignore
/// let mut status = WatchStatus::new();
/// status.success("built dst/thesis.pdf in 2.3s");
/// status.error("compile failed", "! Undefined control sequence.\nl.12 \\foo");
/// ```
pub struct WatchStatus {
    /// Screen lines of the previous block; 0 when it must stay visible.
    height: usize,
}

static WATCH_STATUS: LazyLock<Mutex<WatchStatus>> =
    LazyLock::new(|| Mutex::new(WatchStatus::new()));

impl WatchStatus {
    pub const fn new() -> Self {
        Self { height: 0 }
    }

    pub fn success(&mut self, message: &str) {
        self.show(Mark::Success, message);
    }

    pub fn unchanged(&mut self, message: &str) {
        self.show(Mark::Unchanged, &message.dimmed().to_string());
    }

    /// Summary line, then `detail` (the log excerpt) below it.
    pub fn error(&mut self, summary: &str, detail: &str) {
        if detail.is_empty() {
            self.show(Mark::Failure, summary);
        } else {
            self.show(Mark::Failure, &format!("{summary}\n{detail}"));
        }
    }

    fn show(&mut self, mark: Mark, block: &str) {
        let mut stdout = stdout().lock();

        if let Ok(height @ 1..) = u16::try_from(self.height) {
            execute!(stdout, cursor::MoveUp(height), Clear(ClearType::FromCursorDown)).ok();
        }

        let stamp = format!("[{}]", clock(SystemTime::now())).dimmed().to_string();
        match mark.paint() {
            Some(glyph) => writeln!(stdout, "{stamp} {glyph} {block}"),
            None => writeln!(stdout, "{stamp} {block}"),
        }
        .ok();
        stdout.flush().ok();

        self.height = line_count(block);
    }

    /// Forget the previous block so the next one does not overwrite it.
    pub fn detach(&mut self) {
        self.height = 0;
    }
}

fn line_count(block: &str) -> usize {
    block.matches('\n').count() + 1
}

pub fn status_success(message: &str) {
    WATCH_STATUS.lock().success(message);
}

pub fn status_unchanged(message: &str) {
    WATCH_STATUS.lock().unchanged(message);
}

pub fn status_error(summary: &str, detail: &str) {
    WATCH_STATUS.lock().error(summary, detail);
}

// ============================================================================
// Tests
// ============================================================================
