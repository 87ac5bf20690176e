//! Transcoder output parsing: total duration and elapsed time to a 0–100 percentage.
//!
//! The transcoder prints a one-time `Duration: HH:MM:SS.ff` line while probing
//! the input and repeated `time=HH:MM:SS.ff` markers (or `out_time=` with
//! `-progress pipe:1`) while processing. Fractional seconds are discarded.

use regex::Regex;
use std::sync::LazyLock;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Duration: (\d{2}):(\d{2}):(\d{2})\.\d{2}").expect("duration pattern is valid")
});

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"time=(\d{2}):(\d{2}):(\d{2})\.\d{2}").expect("time pattern is valid")
});

/// Parses `HH:MM:SS` captures 1..=3 into whole seconds.
fn captured_seconds(re: &Regex, line: &str) -> Option<u64> {
    let caps = re.captures(line)?;
    let mut total = 0u64;
    for (idx, scale) in [(1, 3600u64), (2, 60), (3, 1)] {
        let value: u64 = caps.get(idx)?.as_str().parse().ok()?;
        total += value * scale;
    }
    Some(total)
}

/// Whole seconds from a `Duration: HH:MM:SS.ff` announcement, if the line has one.
pub fn parse_duration_line(line: &str) -> Option<u64> {
    captured_seconds(&DURATION_RE, line)
}

/// Whole seconds from a `time=HH:MM:SS.ff` marker, if the line has one.
pub fn parse_time_marker(line: &str) -> Option<u64> {
    captured_seconds(&TIME_RE, line)
}

/// Per-job parser state. Feed it every output line in order.
#[derive(Debug, Clone, Default)]
pub struct ProgressParser {
    total_secs: Option<u64>,
    last_percent: Option<f64>,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total media duration, once announced. A zero duration counts as unknown.
    pub fn total_secs(&self) -> Option<u64> {
        self.total_secs
    }

    pub fn last_percent(&self) -> Option<f64> {
        self.last_percent
    }

    /// Consume one line. Returns a percentage in [0, 100] when the line carries a
    /// time marker, the duration is known, and the value does not go backwards.
    pub fn feed(&mut self, line: &str) -> Option<f64> {
        if self.total_secs.is_none() {
            if let Some(secs) = parse_duration_line(line).filter(|s| *s > 0) {
                tracing::debug!(total_secs = secs, "media duration announced");
                self.total_secs = Some(secs);
            }
        }

        let total = self.total_secs?;
        let elapsed = parse_time_marker(line)?;
        let percent = (elapsed as f64 / total as f64 * 100.0).min(100.0);
        if self.last_percent.is_some_and(|last| percent < last) {
            return None;
        }
        self.last_percent = Some(percent);
        Some(percent)
    }
}
