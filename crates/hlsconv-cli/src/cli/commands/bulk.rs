//! `hlsconv bulk` – run a batch of conversions on the worker pool.

use anyhow::{bail, Result};
use hlsconv_core::batch::{BatchEvent, BatchHandle, BatchPlan, BulkOrchestrator};
use hlsconv_core::config::HlsconvConfig;
use hlsconv_core::control::default_control_socket_path;
use hlsconv_core::history::UrlHistory;
use hlsconv_core::job::JobSpec;
use hlsconv_core::session::Session;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::collect_sources;
use crate::cli::control_socket;

pub async fn run_bulk(
    cfg: &HlsconvConfig,
    files: &[PathBuf],
    name: &str,
    workers: Option<usize>,
    urls: Vec<String>,
) -> Result<()> {
    let session_path = Session::default_path()?;
    let mut sources = collect_sources(files, urls);
    let from_session = sources.is_empty();
    if from_session {
        sources = Session::load(&session_path)?.urls;
    }
    if sources.is_empty() {
        bail!("no URLs given (use --file, positional URLs, or `hlsconv session add`)");
    }

    let socket_path = default_control_socket_path()?;
    if control_socket::is_listening(&socket_path).await {
        bail!("another bulk conversion is running");
    }

    let plan = BatchPlan::numbered(
        sources.iter().cloned(),
        &cfg.resolved_output_root(),
        name,
        &cfg.output_extension,
    )?;
    let mut cfg = cfg.clone();
    if let Some(n) = workers {
        cfg.max_workers = n;
    }
    let orchestrator = Arc::new(BulkOrchestrator::new(&cfg));

    println!(
        "Converting {} file(s) into {} with {} worker(s)",
        plan.specs.len(),
        plan.output_dir.display(),
        cfg.workers()
    );
    let (tx, rx) = std::sync::mpsc::channel();
    let (handle, listener) = start_with_control(&orchestrator, plan.specs, tx, &socket_path)?;

    let mut reporter = tokio::task::spawn_blocking(move || report(rx));
    let succeeded = tokio::select! {
        res = &mut reporter => res?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nCancelling...");
            orchestrator.cancel_batch();
            reporter.await?
        }
    };
    let status = tokio::task::spawn_blocking(move || handle.wait()).await?;

    if let Some(listener) = listener {
        listener.abort();
        let _ = std::fs::remove_file(&socket_path);
    }

    match UrlHistory::open_default() {
        Ok(history) => {
            for index in &succeeded {
                if let Err(e) = history.save(&sources[*index]) {
                    tracing::warn!("could not record {} in history: {:#}", sources[*index], e);
                }
            }
        }
        Err(e) => tracing::warn!("history unavailable: {:#}", e),
    }

    println!(
        "Finished: {} succeeded, {} failed or cancelled.",
        status.succeeded, status.failed
    );
    if status.failed > 0 {
        bail!("{} of {} conversion(s) did not complete", status.failed, status.total);
    }
    if from_session {
        Session::clear(&session_path)?;
    }
    Ok(())
}

/// Start the batch, then bind the control socket for it. A batch that fails
/// to start leaves no socket behind; a socket that fails to bind only loses
/// `hlsconv cancel`.
fn start_with_control(
    orchestrator: &Arc<BulkOrchestrator>,
    specs: Vec<JobSpec>,
    events: Sender<BatchEvent>,
    socket_path: &Path,
) -> Result<(BatchHandle, Option<JoinHandle<()>>)> {
    let handle = orchestrator.start_batch(specs, Some(events))?;
    let listener = match control_socket::spawn_control_listener(Arc::clone(orchestrator), socket_path)
    {
        Ok(task) => {
            tracing::debug!(path = %socket_path.display(), "control socket listening");
            Some(task)
        }
        Err(e) => {
            tracing::warn!(path = %socket_path.display(), "control socket unavailable: {:#}", e);
            None
        }
    };
    Ok((handle, listener))
}

/// Print batch events until Done. Returns the indices of jobs that succeeded.
fn report(rx: Receiver<BatchEvent>) -> Vec<usize> {
    let mut succeeded = Vec::new();
    let mut shown_decile: HashMap<usize, u32> = HashMap::new();
    for event in rx {
        match event {
            BatchEvent::JobProgress { index, percent } => {
                let decile = (percent / 10.0) as u32;
                let shown = shown_decile.entry(index).or_insert(0);
                if decile > *shown {
                    *shown = decile;
                    println!("  #{}: {:.0}%", index + 1, percent);
                }
            }
            BatchEvent::JobFinished {
                index,
                success,
                remaining,
            } => {
                if success {
                    succeeded.push(index);
                    println!("  #{} done", index + 1);
                } else {
                    println!("  #{} failed", index + 1);
                }
                println!("Files remaining: {}", remaining);
            }
            BatchEvent::Done(_) => break,
        }
    }
    succeeded
}
