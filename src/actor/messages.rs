//! Actor Message Definitions
//!
//! ```text
//! FsActor --Trigger--> LoopController --run--> PipelineRunner
//! ```

use crate::core::{BuildTrigger, WatcherFatalError};

/// Messages from FsActor to the loop controller
#[derive(Debug)]
pub enum WatchMsg {
    /// Sources changed and the quiet window elapsed
    Trigger(BuildTrigger),
    /// Watching cannot continue
    Fatal(WatcherFatalError),
}
