//! Process-wide shutdown state.
//!
//! Ctrl+C cancels one global token. Everything that must stop (the loop
//! controller, the running subprocess) derives from it; the active build
//! itself is never tracked here.

use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Cancelled once on the first Ctrl+C.
static SHUTDOWN_TOKEN: LazyLock<CancellationToken> = LazyLock::new(CancellationToken::new);

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// First Ctrl+C: graceful shutdown (running subprocess is terminated, the
/// loop exits). Second Ctrl+C: exit immediately.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        if SHUTDOWN.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        SHUTDOWN_TOKEN.cancel();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Token cancelled when shutdown is requested.
pub fn shutdown_token() -> CancellationToken {
    SHUTDOWN_TOKEN.clone()
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
