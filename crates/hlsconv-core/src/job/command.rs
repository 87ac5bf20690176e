//! Transcoder command line: stream copy with machine-readable progress on stdout.

use std::ffi::OsString;
use std::process::{Command, Stdio};

use super::{CodecPolicy, JobSpec};

/// Builds `<tool> -i <source> -y -progress pipe:1 -vcodec copy -acodec copy <destination>`.
#[derive(Debug, Clone)]
pub struct TranscodeCommand {
    program: String,
}

impl Default for TranscodeCommand {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl TranscodeCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self, spec: &JobSpec) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            spec.source.as_str().into(),
            "-y".into(),
            "-progress".into(),
            "pipe:1".into(),
        ];
        match spec.policy {
            CodecPolicy::StreamCopy => {
                args.extend(["-vcodec", "copy", "-acodec", "copy"].map(OsString::from));
            }
        }
        args.push(spec.destination.clone().into_os_string());
        args
    }

    /// Process ready to spawn: no stdin, both output streams piped.
    pub fn build(&self, spec: &JobSpec) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(spec))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd
    }
}
