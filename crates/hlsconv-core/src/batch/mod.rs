//! Bulk orchestration: one cancellation signal and one set of counters per
//! batch, jobs drained from a queue into the bounded worker pool.
//!
//! Batch status is reported as "remaining = total - completed"; per-job
//! progress is forwarded with the job's index and not rolled up.

mod error;
mod plan;
mod state;

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::config::HlsconvConfig;
use crate::control::CancellationSignal;
use crate::job::{ConversionJob, JobSpec, TranscodeCommand};
use crate::scheduler::{JobQueue, WorkerPool};

pub use error::BatchError;
pub use plan::{remove_output_dir, BatchPlan};
pub use state::BatchStatus;

use self::state::BatchState;

/// Observable batch events, in per-job order: progress, then exactly one finish.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    JobProgress { index: usize, percent: f64 },
    JobFinished { index: usize, success: bool, remaining: usize },
    Done(BatchStatus),
}

/// Caller-side view of a submitted batch.
#[derive(Clone)]
pub struct BatchHandle {
    state: Arc<BatchState>,
    cancel: CancellationSignal,
}

impl BatchHandle {
    pub fn status(&self) -> BatchStatus {
        self.state.snapshot()
    }

    /// Block until every job has reported completion.
    pub fn wait(&self) -> BatchStatus {
        self.state.wait_done()
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Option<BatchStatus> {
        self.state.wait_done_timeout(timeout)
    }

    /// Cancel this batch only. A no-op once it is Done, even if a newer batch is running.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Drives batches of conversion jobs on a shared worker pool.
pub struct BulkOrchestrator {
    pool: Arc<WorkerPool>,
    command: TranscodeCommand,
    poll_interval: Duration,
    current: Mutex<Option<ActiveBatch>>,
}

/// The most recent batch: its counters and the signal only its jobs observe.
struct ActiveBatch {
    state: Arc<BatchState>,
    cancel: CancellationSignal,
}

impl BulkOrchestrator {
    pub fn new(cfg: &HlsconvConfig) -> Self {
        Self::with_pool(
            Arc::new(WorkerPool::new(cfg.workers())),
            TranscodeCommand::new(cfg.transcoder.clone()),
            cfg.cancel_poll_interval(),
        )
    }

    pub fn with_pool(pool: Arc<WorkerPool>, command: TranscodeCommand, poll_interval: Duration) -> Self {
        Self {
            pool,
            command,
            poll_interval,
            current: Mutex::new(None),
        }
    }

    /// Status of the most recent batch, if any.
    pub fn status(&self) -> Option<BatchStatus> {
        self.lock_current().as_ref().map(|b| b.state.snapshot())
    }

    pub fn is_busy(&self) -> bool {
        self.status().is_some_and(|s| !s.done)
    }

    fn lock_current(&self) -> std::sync::MutexGuard<'_, Option<ActiveBatch>> {
        self.current.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Fresh counters and a fresh cancellation signal, then feed `specs` to the pool
    /// from a background drain thread. Destinations must already be distinct.
    pub fn start_batch(
        &self,
        specs: Vec<JobSpec>,
        events: Option<Sender<BatchEvent>>,
    ) -> Result<BatchHandle, BatchError> {
        if specs.is_empty() {
            return Err(BatchError::EmptyBatch);
        }

        let state = Arc::new(BatchState::new(specs.len()));
        let cancel = CancellationSignal::new();
        {
            let mut current = self.lock_current();
            if let Some(prev) = current.as_ref() {
                let status = prev.state.snapshot();
                if !status.done {
                    return Err(BatchError::InProgress {
                        remaining: status.remaining(),
                    });
                }
            }
            *current = Some(ActiveBatch {
                state: Arc::clone(&state),
                cancel: cancel.clone(),
            });
        }

        tracing::info!(total = specs.len(), workers = self.pool.capacity(), "batch started");

        let queue = JobQueue::new();
        for spec in specs {
            queue.enqueue(spec);
        }

        let drain = Drain {
            queue,
            pool: Arc::clone(&self.pool),
            command: self.command.clone(),
            poll_interval: self.poll_interval,
            cancel: cancel.clone(),
            state: Arc::clone(&state),
            events,
        };
        let spawned = thread::Builder::new()
            .name("hlsconv-batch-drain".to_string())
            .spawn(move || drain.run());
        if let Err(e) = spawned {
            // The closure (and its queue) is gone; nothing will complete these jobs.
            tracing::error!("spawn batch drain thread: {}", e);
            self.lock_current().take();
            return Err(BatchError::Io(e));
        }

        Ok(BatchHandle { state, cancel })
    }

    /// Stop all running and pending jobs of the current batch. Idempotent;
    /// a no-op when no batch has been started.
    pub fn cancel_batch(&self) {
        let current = self.lock_current();
        if let Some(batch) = current.as_ref() {
            if batch.cancel.cancel() {
                tracing::info!(status = ?batch.state.snapshot(), "batch cancellation requested");
            }
        }
    }

    /// Delete a batch output folder; refused while a batch is running.
    pub fn remove_output_dir(&self, dir: &std::path::Path) -> Result<(), BatchError> {
        if let Some(status) = self.status().filter(|s| !s.done) {
            return Err(BatchError::InProgress {
                remaining: status.remaining(),
            });
        }
        remove_output_dir(dir)?;
        Ok(())
    }
}

/// Background half of a batch: pops specs and submits one job per spec.
struct Drain {
    queue: JobQueue,
    pool: Arc<WorkerPool>,
    command: TranscodeCommand,
    poll_interval: Duration,
    cancel: CancellationSignal,
    state: Arc<BatchState>,
    events: Option<Sender<BatchEvent>>,
}

impl Drain {
    fn run(self) {
        let mut index = 0usize;
        while let Some(spec) = self.queue.dequeue() {
            let progress_events = self.events.clone();
            let finish = Finisher {
                index,
                state: Arc::clone(&self.state),
                events: self.events.clone(),
            };
            let fallback = finish.clone();
            let job = ConversionJob::new(spec, self.command.clone(), self.cancel.clone())
                .with_poll_interval(self.poll_interval)
                .on_progress(move |percent| {
                    if let Some(tx) = &progress_events {
                        let _ = tx.send(BatchEvent::JobProgress { index, percent });
                    }
                })
                .on_complete(move |success| finish.finish(success));
            if self.pool.submit(move || {
                job.run();
            })
            .is_err()
            {
                tracing::error!(index, "worker pool closed; job not run");
                fallback.finish(false);
            }
            index += 1;
        }
        tracing::debug!(submitted = index, "batch queue drained");
    }
}

/// Completion handler shared by a job and its submit-failure fallback.
#[derive(Clone)]
struct Finisher {
    index: usize,
    state: Arc<BatchState>,
    events: Option<Sender<BatchEvent>>,
}

impl Finisher {
    fn finish(&self, success: bool) {
        self.state.record(success, |recorded| {
            let status = recorded.status;
            tracing::debug!(
                index = self.index,
                success,
                remaining = status.remaining(),
                "batch job finished"
            );
            if let Some(tx) = &self.events {
                let _ = tx.send(BatchEvent::JobFinished {
                    index: self.index,
                    success,
                    remaining: status.remaining(),
                });
            }
            if recorded.finished_batch {
                tracing::info!(
                    total = status.total,
                    succeeded = status.succeeded,
                    failed = status.failed,
                    "batch done"
                );
                if let Some(tx) = &self.events {
                    let _ = tx.send(BatchEvent::Done(status));
                }
            }
        });
    }
}
