//! Control socket: server (during `hlsconv bulk`) and client (for `hlsconv cancel`).
//! Protocol: one line per command; only "cancel" is understood.

use anyhow::Result;
use hlsconv_core::batch::BulkOrchestrator;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

/// Spawns a task that listens on `path` and calls `cancel_batch()` for each
/// "cancel" line. Other lines are logged and ignored.
pub fn spawn_control_listener(
    orchestrator: Arc<BulkOrchestrator>,
    path: impl AsRef<Path>,
) -> Result<tokio::task::JoinHandle<()>> {
    let path = path.as_ref().to_path_buf();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = std::fs::remove_file(&path);
    let listener = UnixListener::bind(&path)?;
    let handle = tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let orchestrator = Arc::clone(&orchestrator);
                    tokio::spawn(async move {
                        let mut reader = BufReader::new(stream).lines();
                        while let Ok(Some(line)) = reader.next_line().await {
                            match line.trim() {
                                "cancel" => orchestrator.cancel_batch(),
                                "" => {}
                                other => tracing::debug!(line = other, "unknown control command"),
                            }
                        }
                    });
                }
                Err(e) => tracing::debug!("control socket accept: {}", e),
            }
        }
    });
    Ok(handle)
}

/// Sends "cancel\n" to the control socket. Returns false when no bulk run is listening.
pub async fn send_cancel(socket_path: &Path) -> Result<bool> {
    let Some(mut stream) = connect(socket_path).await else {
        return Ok(false);
    };
    stream.write_all(b"cancel\n").await?;
    Ok(true)
}

/// True when a bulk run is accepting control connections on `socket_path`.
pub async fn is_listening(socket_path: &Path) -> bool {
    connect(socket_path).await.is_some()
}

async fn connect(socket_path: &Path) -> Option<UnixStream> {
    if !socket_path.exists() {
        return None;
    }
    match UnixStream::connect(socket_path).await {
        Ok(stream) => Some(stream),
        Err(e) => {
            // Stale file left by a crashed run.
            tracing::debug!(path = %socket_path.display(), "control socket connect: {}", e);
            None
        }
    }
}
