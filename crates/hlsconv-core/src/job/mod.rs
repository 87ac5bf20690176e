//! One conversion job: launch the transcoder, pump its output through the
//! progress parser, honour the shared cancellation signal, and report exactly
//! one completion.

mod command;
mod error;
mod guard;
mod stream;

use std::collections::VecDeque;
use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_CANCEL_POLL_MS;
use crate::control::CancellationSignal;
use crate::progress::ProgressParser;

pub use command::TranscodeCommand;
pub use error::JobError;

use self::guard::ChildGuard;
use self::stream::{MergedLines, NextLine};

/// Output lines kept for the failure diagnostic.
const OUTPUT_TAIL_LINES: usize = 20;

/// How streams are written to the destination container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecPolicy {
    /// Copy audio and video streams without re-encoding.
    #[default]
    StreamCopy,
}

/// Immutable description of one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Source locator: stream URL or local path.
    pub source: String,
    pub destination: PathBuf,
    #[serde(default)]
    pub policy: CodecPolicy,
}

impl JobSpec {
    pub fn new(source: impl Into<String>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            policy: CodecPolicy::StreamCopy,
        }
    }
}

/// Lifecycle of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl JobPhase {
    pub fn is_terminal(self) -> bool {
        !matches!(self, JobPhase::Pending | JobPhase::Running)
    }
}

/// Terminal result of [`ConversionJob::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JobOutcome {
    pub phase: JobPhase,
    /// Last progress value reported, if the duration was ever known.
    pub last_percent: Option<f64>,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.phase == JobPhase::Succeeded
    }
}

pub type ProgressFn = Box<dyn FnMut(f64) + Send>;
pub type CompletionFn = Box<dyn FnOnce(bool) + Send>;

/// Per-job mutable record, owned by the running job.
#[derive(Debug)]
struct JobState {
    phase: JobPhase,
    last_percent: Option<f64>,
}

/// Runs one [`JobSpec`] to a terminal state.
///
/// `run` consumes the job, so the completion callback fires exactly once and
/// always after the last progress report.
pub struct ConversionJob {
    spec: JobSpec,
    command: TranscodeCommand,
    cancel: CancellationSignal,
    poll_interval: Duration,
    on_progress: ProgressFn,
    on_complete: CompletionFn,
}

impl ConversionJob {
    pub fn new(spec: JobSpec, command: TranscodeCommand, cancel: CancellationSignal) -> Self {
        Self {
            spec,
            command,
            cancel,
            poll_interval: Duration::from_millis(DEFAULT_CANCEL_POLL_MS),
            on_progress: Box::new(|_| {}),
            on_complete: Box::new(|_| {}),
        }
    }

    pub fn spec(&self) -> &JobSpec {
        &self.spec
    }

    /// Upper bound on how long the job blocks on silent output before re-checking cancellation.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn on_progress(mut self, f: impl FnMut(f64) + Send + 'static) -> Self {
        self.on_progress = Box::new(f);
        self
    }

    pub fn on_complete(mut self, f: impl FnOnce(bool) + Send + 'static) -> Self {
        self.on_complete = Box::new(f);
        self
    }

    /// Execute synchronously on the calling thread. Never panics or errors past
    /// this boundary; every failure is logged and reported as `false`.
    pub fn run(self) -> JobOutcome {
        let ConversionJob {
            spec,
            command,
            cancel,
            poll_interval,
            mut on_progress,
            on_complete,
        } = self;

        let mut state = JobState {
            phase: JobPhase::Pending,
            last_percent: None,
        };

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            drive(&spec, &command, &cancel, poll_interval, &mut state, &mut on_progress)
        }))
        .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(payload.as_ref()))));

        state.phase = match &result {
            Ok(()) => {
                tracing::info!(
                    source = %spec.source,
                    destination = %spec.destination.display(),
                    "conversion succeeded"
                );
                JobPhase::Succeeded
            }
            Err(err) => {
                log_failure(&spec, err);
                match err {
                    JobError::Cancelled { .. } => JobPhase::Cancelled,
                    _ => JobPhase::Failed,
                }
            }
        };

        let outcome = JobOutcome {
            phase: state.phase,
            last_percent: state.last_percent,
        };
        if panic::catch_unwind(AssertUnwindSafe(|| on_complete(outcome.succeeded()))).is_err() {
            tracing::error!(source = %spec.source, "completion callback panicked");
        }
        outcome
    }
}

fn drive(
    spec: &JobSpec,
    command: &TranscodeCommand,
    cancel: &CancellationSignal,
    poll_interval: Duration,
    state: &mut JobState,
    on_progress: &mut ProgressFn,
) -> Result<(), JobError> {
    if cancel.is_cancelled() {
        return Err(JobError::Cancelled { launched: false });
    }

    let launch_err = |source| JobError::Launch {
        program: command.program().to_string(),
        source,
    };
    if let Some(parent) = spec.destination.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(launch_err)?;
    }
    let child = command.build(spec).spawn().map_err(launch_err)?;
    let mut child = ChildGuard::new(child);
    state.phase = JobPhase::Running;
    tracing::debug!(
        pid = child.id(),
        source = %spec.source,
        destination = %spec.destination.display(),
        "transcoder started"
    );

    let (stdout, stderr) = child.take_output().ok_or_else(|| {
        JobError::Stream(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "transcoder output not captured",
        ))
    })?;
    let lines = MergedLines::spawn(stdout, stderr);
    let mut parser = ProgressParser::new();
    let mut tail: VecDeque<String> = VecDeque::with_capacity(OUTPUT_TAIL_LINES);

    loop {
        let next = lines.next(poll_interval);
        if cancel.is_cancelled() {
            if let Err(e) = child.terminate() {
                tracing::warn!(source = %spec.source, "terminate transcoder: {}", e);
            }
            return Err(JobError::Cancelled { launched: true });
        }
        match next {
            NextLine::Line(line) => {
                if let Some(percent) = parser.feed(&line) {
                    state.last_percent = Some(percent);
                    on_progress(percent);
                }
                if tail.len() == OUTPUT_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
            NextLine::Idle => {}
            NextLine::Failed(e) => return Err(JobError::Stream(e)),
            NextLine::Closed => break,
        }
    }
    lines.join();

    let status = child.wait().map_err(JobError::Stream)?;
    if status.success() {
        Ok(())
    } else {
        Err(JobError::Exit {
            code: status.code(),
            output_tail: Vec::from(tail).join("\n"),
        })
    }
}

fn log_failure(spec: &JobSpec, err: &JobError) {
    let source = spec.source.as_str();
    let destination = spec.destination.display();
    match err {
        JobError::Cancelled { .. } => {
            tracing::info!(cause = err.cause(), %source, %destination, "conversion {}", err);
        }
        JobError::Exit { output_tail, .. } => {
            tracing::error!(
                cause = err.cause(),
                %source,
                %destination,
                "conversion failed: {}\n{}",
                err,
                output_tail
            );
        }
        _ => {
            tracing::error!(cause = err.cause(), %source, %destination, "conversion failed: {}", err);
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn pre_cancelled_job_reports_failure_without_launch() {
        let cancel = CancellationSignal::new();
        cancel.cancel();
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let outcome = ConversionJob::new(
            JobSpec::new("in.m3u8", "out.mp4"),
            TranscodeCommand::new("/nonexistent/transcoder"),
            cancel,
        )
        .on_complete(move |ok| sink.lock().unwrap().push(ok))
        .run();
        assert_eq!(outcome.phase, JobPhase::Cancelled);
        assert_eq!(*reports.lock().unwrap(), vec![false]);
    }

    #[test]
    fn missing_transcoder_is_a_launch_failure() {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let outcome = ConversionJob::new(
            JobSpec::new("in.m3u8", "out.mp4"),
            TranscodeCommand::new("/nonexistent/hlsconv-transcoder"),
            CancellationSignal::new(),
        )
        .on_complete(move |ok| sink.lock().unwrap().push(ok))
        .run();
        assert_eq!(outcome.phase, JobPhase::Failed);
        assert!(outcome.last_percent.is_none());
        assert_eq!(*reports.lock().unwrap(), vec![false]);
    }

    #[test]
    fn terminal_phases() {
        assert!(!JobPhase::Pending.is_terminal());
        assert!(!JobPhase::Running.is_terminal());
        assert!(JobPhase::Succeeded.is_terminal());
        assert!(JobPhase::Failed.is_terminal());
        assert!(JobPhase::Cancelled.is_terminal());
    }
}
