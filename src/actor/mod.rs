//! Loop mode.
//!
//! ```text
//! FsActor ──WatchMsg──▶ LoopController ──▶ PipelineRunner
//! (notify + debounce)   (one attempt)      (sync/compile/publish)
//! ```
//!
//! `fs` turns raw notify events into numbered triggers, `coordinator` owns
//! the single in-flight attempt and `messages` is what passes between them.

pub mod coordinator;
pub mod fs;
pub mod messages;

pub use coordinator::{Coordinator, LoopController};
