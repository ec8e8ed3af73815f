//! Configuration sections.

mod build;
mod publish;
mod sync;
mod watch;

pub use build::BuildConfig;
pub use publish::PublishConfig;
pub use sync::SyncConfig;
pub use watch::WatchConfig;
