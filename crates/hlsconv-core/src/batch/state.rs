//! Batch counters, updated from job completion callbacks on worker threads.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Snapshot of batch progress. `completed == succeeded + failed <= total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchStatus {
    pub total: usize,
    pub completed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub done: bool,
}

impl BatchStatus {
    /// Jobs not yet finished (`total - completed`).
    pub fn remaining(&self) -> usize {
        self.total - self.completed
    }
}

/// Result of recording one job completion.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Recorded {
    pub status: BatchStatus,
    /// True only for the completion that made the batch Done.
    pub finished_batch: bool,
}

#[derive(Debug)]
pub(crate) struct BatchState {
    status: Mutex<BatchStatus>,
    done_cv: Condvar,
}

impl BatchState {
    pub(crate) fn new(total: usize) -> Self {
        Self {
            status: Mutex::new(BatchStatus {
                total,
                ..BatchStatus::default()
            }),
            done_cv: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BatchStatus> {
        self.status.lock().unwrap_or_else(|p| p.into_inner())
    }

    pub(crate) fn snapshot(&self) -> BatchStatus {
        *self.lock()
    }

    /// Count one finished job. Completions beyond `total` are ignored and logged.
    ///
    /// `notify` runs while the counters are still locked, so observers see
    /// notifications in the same order as the increments.
    pub(crate) fn record(&self, success: bool, notify: impl FnOnce(&Recorded)) -> Recorded {
        let mut status = self.lock();
        if status.completed >= status.total {
            tracing::error!(?status, "completion reported after batch was done; ignored");
            return Recorded {
                status: *status,
                finished_batch: false,
            };
        }
        status.completed += 1;
        if success {
            status.succeeded += 1;
        } else {
            status.failed += 1;
        }
        let finished_batch = status.completed == status.total;
        status.done = finished_batch;
        let recorded = Recorded {
            status: *status,
            finished_batch,
        };
        notify(&recorded);
        if finished_batch {
            self.done_cv.notify_all();
        }
        recorded
    }

    pub(crate) fn wait_done(&self) -> BatchStatus {
        let mut status = self.lock();
        while !status.done {
            status = self.done_cv.wait(status).unwrap_or_else(|p| p.into_inner());
        }
        *status
    }

    pub(crate) fn wait_done_timeout(&self, timeout: Duration) -> Option<BatchStatus> {
        let deadline = Instant::now() + timeout;
        let mut status = self.lock();
        while !status.done {
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            status = self
                .done_cv
                .wait_timeout(status, deadline - now)
                .unwrap_or_else(|p| p.into_inner())
                .0;
        }
        Some(*status)
    }
}
