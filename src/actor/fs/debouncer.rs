use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::{ChangeEvent, ChangeKind};
use crate::core::BuildTrigger;

/// Sleep used while nothing is pending.
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

/// Pure debouncer: only handles timing, deduplication and sequence numbers.
///
/// Time is passed in, never read, so tests can replay exact schedules.
pub(super) struct Debouncer {
    quiet: Duration,
    /// Path → ChangeKind (dedup is free via HashMap key uniqueness)
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
    next_seq: u64,
}

impl Debouncer {
    /// `first_seq` is the sequence number of the first trigger emitted.
    pub(super) fn new(quiet: Duration, first_seq: u64) -> Self {
        Self {
            quiet,
            changes: FxHashMap::default(),
            last_event: None,
            next_seq: first_seq,
        }
    }

    /// Record a change and restart the quiet window.
    pub(super) fn add(&mut self, event: ChangeEvent) {
        let ChangeEvent { path, kind, at } = event;
        self.last_event = Some(self.last_event.map_or(at, |last| last.max(at)));

        let Some(&existing) = self.changes.get(&path) else {
            crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
            self.changes.insert(path, kind);
            return;
        };

        // State transitions:
        // - Removed -> Created/Modified: restored, use new event
        // - Modified -> Removed: deleted, upgrade to Removed
        // - Created -> Removed: appeared then vanished, discard (no-op)
        // - otherwise: first event wins
        match (existing, kind) {
            (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                crate::debug!("watch"; "restore {}->{}: {}", existing.label(), kind.label(), path.display());
                self.changes.insert(path, kind);
            }
            (ChangeKind::Modified, ChangeKind::Removed) => {
                crate::debug!("watch"; "upgrade modified->removed: {}", path.display());
                self.changes.insert(path, ChangeKind::Removed);
            }
            (ChangeKind::Created, ChangeKind::Removed) => {
                crate::debug!("watch"; "discard created+removed: {}", path.display());
                self.changes.remove(&path);
            }
            _ => {}
        }
    }

    pub(super) fn is_ready_at(&self, now: Instant) -> bool {
        self.last_event
            .is_some_and(|last| now.saturating_duration_since(last) >= self.quiet)
    }

    /// Emit a trigger once the window has been quiet.
    ///
    /// A burst that nets out to nothing (a temp file created and removed)
    /// resets the window without emitting.
    pub(super) fn take_trigger(
        &mut self,
        now: Instant,
    ) -> Option<(BuildTrigger, Vec<(PathBuf, ChangeKind)>)> {
        if !self.is_ready_at(now) {
            return None;
        }

        self.last_event = None;
        let changes = std::mem::take(&mut self.changes);
        if changes.is_empty() {
            return None;
        }

        let trigger = BuildTrigger::new(self.next_seq);
        self.next_seq += 1;

        let mut changes: Vec<_> = changes.into_iter().collect();
        changes.sort_by(|a, b| a.0.cmp(&b.0));
        Some((trigger, changes))
    }

    /// Precise sleep duration until the window can close.
    pub(super) fn sleep_duration_at(&self, now: Instant) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE_SLEEP;
        };

        self.quiet
            .saturating_sub(now.saturating_duration_since(last_event))
            .max(Duration::from_millis(1))
    }

    pub(super) fn sleep_duration(&self) -> Duration {
        self.sleep_duration_at(Instant::now())
    }
}
