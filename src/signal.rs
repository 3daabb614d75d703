//! Ctrl+C handling.
//!
//! A scan is cancelled cooperatively: the handler only sets a shared flag, and
//! the walker checks it before each directory and each photo. An interrupted
//! scan returns [`ScanError::Interrupted`](crate::scan::ScanError::Interrupted)
//! before the flat index is written or any stale artifact is reclaimed, so the
//! cache is never pruned against a partial tree.
//!
//! The process then exits with [`EXIT_CODE_INTERRUPTED`] (128 + SIGINT).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

/// Exit code for an interrupted scan: 128 + SIGINT.
pub const EXIT_CODE_INTERRUPTED: u8 = 130;

/// Shared interrupt flag.
///
/// Cloning shares the flag; `ShutdownHandler` is `Send + Sync` and can be
/// checked from rayon workers.
#[derive(Debug, Clone)]
pub struct ShutdownHandler {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandler {
    /// A handler with no shutdown requested and no signal hook attached.
    #[must_use]
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Request a shutdown without a signal, as tests and the handler itself do.
    pub fn request_shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static GLOBAL_HANDLER: OnceLock<ShutdownHandler> = OnceLock::new();

/// Install the process-wide Ctrl+C hook and return its handler.
///
/// Calling it again returns the already installed handler, reset.
pub fn install_handler() -> Result<ShutdownHandler, SignalError> {
    if let Some(handler) = GLOBAL_HANDLER.get() {
        handler.reset();
        return Ok(handler.clone());
    }

    let handler = ShutdownHandler::new();
    let hooked = handler.clone();
    ctrlc::set_handler(move || {
        hooked.request_shutdown();
        // stderr is unbuffered but may be mid-line from a progress event
        let _ = writeln!(std::io::stderr(), "\nInterrupted, finishing current photos...");
        let _ = std::io::stderr().flush();
        log::info!("Shutdown signal received");
    })?;

    let _ = GLOBAL_HANDLER.set(handler.clone());
    Ok(handler)
}
