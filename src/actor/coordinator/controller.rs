//! Loop controller: feeds triggers to the pipeline, one attempt at a time.
//!
//! ```text
//! Idle ──trigger──▶ BuildRequested ──spawn──▶ Building ──done──▶ Idle
//!                        ▲                        │
//!                        └──── newer trigger ─────┘  (cancel, join, restart)
//! ```
//!
//! The active attempt lives in exactly one place, `LoopController::active`.
//! A new attempt is only spawned after the previous one was joined, so two
//! compiler process groups never overlap.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::actor::messages::WatchMsg;
use crate::core::{BuildAttempt, BuildTrigger, WatcherFatalError};
use crate::pipeline::PipelineRunner;
use crate::report::Reporter;
use crate::{debug, log};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    /// Trigger accepted, previous attempt (if any) being cancelled.
    BuildRequested(u64),
    Building(u64),
}

/// Handle to the one attempt in flight.
struct ActiveBuild {
    seq: u64,
    cancel: CancellationToken,
    handle: JoinHandle<BuildAttempt>,
}

pub struct LoopController<R: Reporter> {
    runner: Arc<PipelineRunner>,
    reporter: R,
    /// Parent of every attempt's token; cancelled on Ctrl+C.
    shutdown: CancellationToken,
    state: LoopState,
    active: Option<ActiveBuild>,
}

impl<R: Reporter> LoopController<R> {
    pub fn new(runner: Arc<PipelineRunner>, reporter: R, shutdown: CancellationToken) -> Self {
        Self {
            runner,
            reporter,
            shutdown,
            state: LoopState::Idle,
            active: None,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// One-shot mode: run exactly one attempt and report it.
    pub async fn run_once(&mut self, trigger: BuildTrigger) -> BuildAttempt {
        self.state = LoopState::BuildRequested(trigger.seq());
        let active = self.spawn(trigger);
        let attempt = join(active).await;
        self.finish(&attempt);
        attempt
    }

    /// Continuous mode.
    ///
    /// Runs `initial` right away (if given), then one attempt per trigger
    /// from `events`. Returns `Ok` on shutdown, `Err` when the watcher fails.
    pub async fn run(
        &mut self,
        mut events: mpsc::Receiver<WatchMsg>,
        initial: Option<BuildTrigger>,
    ) -> Result<(), WatcherFatalError> {
        let shutdown = self.shutdown.clone();

        if let Some(trigger) = initial {
            self.state = LoopState::BuildRequested(trigger.seq());
            self.active = Some(self.spawn(trigger));
        }

        loop {
            let msg = match self.active.as_mut() {
                Some(active) => tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    joined = &mut active.handle => {
                        if let Some(active) = self.active.take() {
                            let attempt = attempt_or_cancelled(active.seq, joined);
                            self.finish(&attempt);
                        }
                        continue;
                    }
                    msg = events.recv() => msg,
                },
                None => tokio::select! {
                    biased;
                    _ = shutdown.cancelled() => break,
                    msg = events.recv() => msg,
                },
            };

            match msg {
                Some(WatchMsg::Trigger(trigger)) => {
                    if let Err(fatal) = self.supersede(trigger, &mut events).await {
                        self.stop().await;
                        return Err(fatal);
                    }
                }
                Some(WatchMsg::Fatal(fatal)) => {
                    self.stop().await;
                    return Err(fatal);
                }
                None => {
                    self.stop().await;
                    return Err(WatcherFatalError::new("file watcher stopped"));
                }
            }
        }

        debug!("loop"; "shutdown requested");
        self.stop().await;
        Ok(())
    }

    /// Cancel the active attempt (if any), wait for it, then start `trigger`
    /// or whatever newer trigger queued up meanwhile.
    async fn supersede(
        &mut self,
        trigger: BuildTrigger,
        events: &mut mpsc::Receiver<WatchMsg>,
    ) -> Result<(), WatcherFatalError> {
        let mut latest = latest_trigger(events, trigger)?;
        self.state = LoopState::BuildRequested(latest.seq());

        if let Some(active) = self.active.take() {
            debug!("loop"; "{} supersedes #{}", latest, active.seq);
            active.cancel.cancel();
            let attempt = join(active).await;
            self.finish(&attempt);
            // Terminating the old process group takes time; edits keep coming.
            latest = latest_trigger(events, latest)?;
        }

        self.active = Some(self.spawn(latest));
        Ok(())
    }

    fn spawn(&mut self, trigger: BuildTrigger) -> ActiveBuild {
        debug_assert!(self.active.is_none(), "one attempt at a time");

        let cancel = self.shutdown.child_token();
        let runner = Arc::clone(&self.runner);
        let handle = tokio::spawn({
            let cancel = cancel.clone();
            async move { runner.run(trigger, cancel).await }
        });

        debug!("loop"; "{:?} -> building {}", self.state, trigger);
        self.state = LoopState::Building(trigger.seq());
        ActiveBuild {
            seq: trigger.seq(),
            cancel,
            handle,
        }
    }

    fn finish(&mut self, attempt: &BuildAttempt) {
        self.reporter.report(attempt);
        self.state = LoopState::Idle;
    }

    /// Terminate the active attempt without reporting it.
    async fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            join(active).await;
        }
        self.state = LoopState::Idle;
    }
}

/// Newest trigger among `current` and everything already queued.
///
/// A fatal message wins over any pending trigger.
fn latest_trigger(
    events: &mut mpsc::Receiver<WatchMsg>,
    mut current: BuildTrigger,
) -> Result<BuildTrigger, WatcherFatalError> {
    loop {
        match events.try_recv() {
            Ok(WatchMsg::Trigger(trigger)) => {
                if trigger.supersedes(current) {
                    debug!("loop"; "dropping stale {}", current);
                    current = trigger;
                }
            }
            Ok(WatchMsg::Fatal(fatal)) => return Err(fatal),
            // A closed channel surfaces on the next `recv`.
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => return Ok(current),
        }
    }
}

async fn join(active: ActiveBuild) -> BuildAttempt {
    let joined = active.handle.await;
    attempt_or_cancelled(active.seq, joined)
}

/// A panicked attempt task is logged and treated as cancelled.
fn attempt_or_cancelled(
    seq: u64,
    joined: Result<BuildAttempt, tokio::task::JoinError>,
) -> BuildAttempt {
    joined.unwrap_or_else(|err| {
        log!("error"; "build #{} task failed: {}", seq, err);
        let mut attempt = BuildAttempt::start(BuildTrigger::new(seq));
        attempt.cancel();
        attempt
    })
}
