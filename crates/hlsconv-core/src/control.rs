//! Batch cancellation: a shared, level-triggered stop flag and the control socket location.
//!
//! Every job in a batch holds a clone of that batch's `CancellationSignal`; each
//! batch gets a new one. The orchestrator (reached by `hlsconv cancel` through
//! the socket) sets it, and job loops poll it and stop their transcoder process.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag. Cloning shares the same underlying flag.
///
/// Once set it stays set; setting it again is a no-op.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    flag: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Returns true if this call flipped the flag.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Default path for the control socket (XDG state dir).
pub fn default_control_socket_path() -> std::io::Result<PathBuf> {
    let dir = xdg::BaseDirectories::with_prefix("hlsconv")?.get_state_home();
    Ok(dir.join("control.sock"))
}
