//! RAII guard that owns the transcoder child and reaps it on every exit path.

use std::io;
use std::process::{Child, ChildStderr, ChildStdout, ExitStatus};
use std::thread;
use std::time::{Duration, Instant};

/// How long a terminated transcoder gets to exit before it is killed outright.
const TERMINATE_GRACE: Duration = Duration::from_secs(2);
const REAP_POLL: Duration = Duration::from_millis(20);

/// Kills and reaps the child when dropped unless it was already waited on.
pub(super) struct ChildGuard {
    child: Option<Child>,
}

impl ChildGuard {
    pub(super) fn new(child: Child) -> Self {
        Self { child: Some(child) }
    }

    pub(super) fn id(&self) -> Option<u32> {
        self.child.as_ref().map(Child::id)
    }

    pub(super) fn take_output(&mut self) -> Option<(ChildStdout, ChildStderr)> {
        let child = self.child.as_mut()?;
        Some((child.stdout.take()?, child.stderr.take()?))
    }

    /// Block until the child exits and release it.
    pub(super) fn wait(&mut self) -> io::Result<ExitStatus> {
        let Some(child) = self.child.as_mut() else {
            return Err(io::Error::other("transcoder already reaped"));
        };
        let status = child.wait()?;
        self.child = None;
        Ok(status)
    }

    /// Ask the child to stop (SIGTERM on unix), escalate to kill after a grace period, and reap it.
    pub(super) fn terminate(&mut self) -> io::Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };
        if !send_terminate(&child) {
            let _ = child.kill();
        }
        let deadline = Instant::now() + TERMINATE_GRACE;
        loop {
            if child.try_wait()?.is_some() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                tracing::warn!(pid = child.id(), "transcoder ignored terminate; killing");
                let _ = child.kill();
                child.wait()?;
                return Ok(());
            }
            thread::sleep(REAP_POLL);
        }
    }
}

#[cfg(unix)]
fn send_terminate(child: &Child) -> bool {
    let Ok(pid) = libc::pid_t::try_from(child.id()) else {
        return false;
    };
    // SAFETY: plain kill(2) on a pid we spawned and have not reaped yet.
    unsafe { libc::kill(pid, libc::SIGTERM) == 0 }
}

#[cfg(not(unix))]
fn send_terminate(_child: &Child) -> bool {
    false
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
