//! External command execution.
//!
//! Builder-based API for running the sync tool and the compiler as
//! cancellable subprocesses:
//!
//! - stdin is always closed, so a tool waiting for input fails instead of hanging
//! - stdout and stderr are captured into one combined, line-interleaved log
//! - a `CancellationToken` terminates the whole process group
//!
//! # Examples
//!
//! ```ignore
//! use crate::utils::exec::Cmd;
//!
//! let output = Cmd::new("latexmk")
//!     .args(["-halt-on-error", "-interaction=nonstopmode", "-pdf", "doc.tex"])
//!     .cwd(build_root)
//!     .run(&cancel)
//!     .await?;
//! ```

use std::ffi::{OsStr, OsString};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use parking_lot::Mutex;
use regex::Regex;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::log;

/// Time a terminated process group gets before it is killed.
const TERM_GRACE: Duration = Duration::from_millis(1500);

/// Time to drain output pipes after the process exited.
///
/// Detached grandchildren may keep a pipe open forever.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to execute `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for `{program}`")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` failed with {status}")]
    Failed {
        program: String,
        status: ExitStatus,
        output: String,
    },

    #[error("`{program}` was cancelled")]
    Cancelled { program: String },
}

impl ExecError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Captured output of a command that ran and failed.
    #[cfg(test)]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Result of a successful run.
#[derive(Debug)]
pub struct CmdOutput {
    pub status: ExitStatus,
    /// stdout and stderr, interleaved by line, ANSI codes stripped.
    pub combined: String,
}

// ============================================================================
// Builder API
// ============================================================================

/// Command builder for external process execution.
#[derive(Default, Debug, Clone)]
pub struct Cmd {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    filter: Option<&'static FilterRule>,
}

impl Cmd {
    /// Create a new command builder.
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Self {
            program: program.as_ref().to_owned(),
            ..Default::default()
        }
    }

    /// Create from a command array (e.g., `["rsync", "-a", "--delete"]`).
    pub fn from_slice<S: AsRef<OsStr>>(cmd: &[S]) -> Self {
        let mut iter = cmd.iter();
        let program = iter
            .next()
            .map(|s| s.as_ref().to_owned())
            .unwrap_or_default();
        let args: Vec<_> = iter.map(|s| s.as_ref().to_owned()).collect();
        Self {
            program,
            args,
            ..Default::default()
        }
    }

    /// Add a single argument. Empty arguments are dropped.
    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        let arg = arg.as_ref();
        if !arg.is_empty() {
            self.args.push(arg.to_owned());
        }
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        for arg in args {
            self = self.arg(arg);
        }
        self
    }

    /// Set working directory.
    pub fn cwd<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().to_owned());
        self
    }

    /// Set output filter for verbose logging.
    pub fn filter(mut self, filter: &'static FilterRule) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Get the program name for messages.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().to_string()
    }

    /// Command line for display.
    pub fn display(&self) -> String {
        std::iter::once(&self.program)
            .chain(&self.args)
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion, or until `cancel` fires.
    ///
    /// On cancellation the process group is terminated and reaped before
    /// this returns, so nothing the command started is still running.
    pub async fn run(self, cancel: &CancellationToken) -> Result<CmdOutput, ExecError> {
        let name = self.program_name();
        if cancel.is_cancelled() {
            return Err(ExecError::Cancelled { program: name });
        }

        let mut child = self.spawn().map_err(|source| ExecError::Spawn {
            program: name.clone(),
            source,
        })?;

        let combined = Arc::new(Mutex::new(String::new()));
        let readers = [
            child.stdout.take().map(|r| spawn_reader(r, Arc::clone(&combined))),
            child.stderr.take().map(|r| spawn_reader(r, Arc::clone(&combined))),
        ];

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                crate::debug!("exec"; "terminating `{}`", name);
                terminate(&mut child).await;
                drain(readers).await;
                return Err(ExecError::Cancelled { program: name });
            }
            status = child.wait() => status.map_err(|source| ExecError::Wait {
                program: name.clone(),
                source,
            })?,
        };

        drain(readers).await;
        let combined = strip_ansi(&std::mem::take(&mut *combined.lock())).into_owned();

        if !status.success() {
            return Err(ExecError::Failed {
                program: name,
                status,
                output: combined,
            });
        }

        if let Some(filter) = self.filter
            && crate::logger::is_verbose()
        {
            filter.log(&name, &combined);
        }

        Ok(CmdOutput { status, combined })
    }

    fn spawn(&self) -> io::Result<Child> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }

        // Own process group: compilers fork helpers (latexmk -> lualatex -> ...)
        // and all of them must go down together.
        #[cfg(unix)]
        cmd.process_group(0);

        cmd.spawn()
    }
}

// ============================================================================
// Process supervision
// ============================================================================

fn spawn_reader<R>(reader: R, sink: Arc<Mutex<String>>) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut line = Vec::new();
        loop {
            line.clear();
            match reader.read_until(b'\n', &mut line).await {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    // TeX writes in the input encoding; never fail on it.
                    let text = String::from_utf8_lossy(&line);
                    let mut sink = sink.lock();
                    sink.push_str(&text);
                    if !text.ends_with('\n') {
                        sink.push('\n');
                    }
                }
            }
        }
    })
}

async fn drain(readers: [Option<JoinHandle<()>>; 2]) {
    for handle in readers.into_iter().flatten() {
        let abort = handle.abort_handle();
        if tokio::time::timeout(DRAIN_GRACE, handle).await.is_err() {
            abort.abort();
        }
    }
}

/// Terminate the child and its process group, then reap it.
async fn terminate(child: &mut Child) {
    #[cfg(unix)]
    let pid = child.id();

    #[cfg(unix)]
    if let Some(pid) = pid {
        signal_group(pid, nix::sys::signal::Signal::SIGTERM);
    }

    if tokio::time::timeout(TERM_GRACE, child.wait()).await.is_ok() {
        return;
    }

    #[cfg(unix)]
    if let Some(pid) = pid {
        signal_group(pid, nix::sys::signal::Signal::SIGKILL);
    }
    let _ = child.kill().await;
}

#[cfg(unix)]
fn signal_group(pid: u32, signal: nix::sys::signal::Signal) {
    use nix::sys::signal::killpg;
    use nix::unistd::Pid;

    #[allow(clippy::cast_possible_wrap)]
    let pgid = Pid::from_raw(pid as i32);
    if let Err(e) = killpg(pgid, signal) {
        crate::debug!("exec"; "killpg {} {:?}: {}", pid, signal, e);
    }
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Filter rule for command output logging.
///
/// Used to reduce noise by skipping known chatter.
#[derive(Debug)]
pub struct FilterRule {
    /// Prefixes to skip when logging output.
    pub skip_prefixes: &'static [&'static str],
}

impl FilterRule {
    pub const fn new(skip_prefixes: &'static [&'static str]) -> Self {
        Self { skip_prefixes }
    }

    fn should_skip(&self, line: &str) -> bool {
        line.is_empty() || self.skip_prefixes.iter().any(|p| line.starts_with(p))
    }

    /// Log output lines that pass the filter.
    pub fn log(&self, name: &str, output: &str) {
        let lines: Vec<_> = output
            .lines()
            .map(str::trim)
            .filter(|line| !self.should_skip(line))
            .collect();

        if !lines.is_empty() {
            log!(name; "{}", lines.join("\n"));
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Strip ANSI escape codes from string.
pub fn strip_ansi(s: &str) -> std::borrow::Cow<'_, str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| Regex::new(r"\x1b\[[0-9;]*m").unwrap());
    re.replace_all(s, "")
}

// ============================================================================
// Tests
// ============================================================================
