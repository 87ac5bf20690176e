//! Failure causes inside a single conversion job.

use std::io;

/// Why a job did not succeed. Logged by the job, then collapsed to a `false` completion.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// Transcoder could not be started (missing binary, permissions, output dir).
    #[error("could not launch {program}: {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    /// Transcoder ran and exited unsuccessfully.
    #[error("transcoder exited with {}", describe_code(.code))]
    Exit { code: Option<i32>, output_tail: String },
    /// Reading the transcoder's output (or reaping it) failed.
    #[error("transcoder output stream: {0}")]
    Stream(#[source] io::Error),
    /// Cancellation signal observed; `launched` tells whether a process had been started.
    #[error("cancelled {}", launch_phase(.launched))]
    Cancelled { launched: bool },
    /// A callback panicked inside the job.
    #[error("job panicked: {0}")]
    Panicked(String),
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("status {}", c),
        None => "no status (killed by signal)".to_string(),
    }
}

fn launch_phase(launched: &bool) -> &'static str {
    if *launched {
        "while running"
    } else {
        "before launch"
    }
}

impl JobError {
    /// Short cause label for structured log fields.
    pub fn cause(&self) -> &'static str {
        match self {
            JobError::Launch { .. } => "launch",
            JobError::Exit { .. } => "exit",
            JobError::Stream(_) => "stream",
            JobError::Cancelled { .. } => "cancelled",
            JobError::Panicked(_) => "panic",
        }
    }
}
