//! Merges the transcoder's stdout and stderr into one line stream.
//!
//! One reader thread per pipe splits on `\n` and `\r` (the tool rewrites its
//! status line with carriage returns) and forwards lines over a channel. The
//! job loop waits on the channel with a timeout so it can poll cancellation
//! while the tool is silent.

use std::io::{self, BufRead, BufReader, Read};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

enum Chunk {
    Line(String),
    Failed(io::Error),
}

/// Result of one wait on the merged stream.
pub(super) enum NextLine {
    Line(String),
    /// Nothing arrived within the poll interval.
    Idle,
    Failed(io::Error),
    /// Both pipes reached end of stream.
    Closed,
}

pub(super) struct MergedLines {
    rx: Receiver<Chunk>,
    readers: Vec<JoinHandle<()>>,
}

impl MergedLines {
    pub(super) fn spawn<A, B>(first: A, second: B) -> Self
    where
        A: Read + Send + 'static,
        B: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let tx2 = tx.clone();
        let readers = vec![
            thread::spawn(move || pump(first, tx)),
            thread::spawn(move || pump(second, tx2)),
        ];
        Self { rx, readers }
    }

    pub(super) fn next(&self, timeout: Duration) -> NextLine {
        match self.rx.recv_timeout(timeout) {
            Ok(Chunk::Line(line)) => NextLine::Line(line),
            Ok(Chunk::Failed(e)) => NextLine::Failed(e),
            Err(RecvTimeoutError::Timeout) => NextLine::Idle,
            Err(RecvTimeoutError::Disconnected) => NextLine::Closed,
        }
    }

    /// Join reader threads. Only call after `Closed`; otherwise a reader may still block on its pipe.
    pub(super) fn join(self) {
        for handle in self.readers {
            if handle.join().is_err() {
                tracing::warn!("transcoder output reader panicked");
            }
        }
    }
}

fn pump<R: Read>(reader: R, tx: Sender<Chunk>) {
    let mut reader = BufReader::new(reader);
    let mut pending: Vec<u8> = Vec::new();
    loop {
        let buf = match reader.fill_buf() {
            Ok(buf) => buf,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = tx.send(Chunk::Failed(e));
                return;
            }
        };
        if buf.is_empty() {
            if !pending.is_empty() {
                let _ = tx.send(Chunk::Line(String::from_utf8_lossy(&pending).into_owned()));
            }
            return;
        }
        let mut start = 0;
        for (i, byte) in buf.iter().enumerate() {
            if *byte == b'\n' || *byte == b'\r' {
                pending.extend_from_slice(&buf[start..i]);
                start = i + 1;
                if pending.is_empty() {
                    continue;
                }
                let line = String::from_utf8_lossy(&pending).into_owned();
                pending.clear();
                if tx.send(Chunk::Line(line)).is_err() {
                    return;
                }
            }
        }
        pending.extend_from_slice(&buf[start..]);
        let len = buf.len();
        reader.consume(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(lines: MergedLines) -> Vec<String> {
        let mut out = Vec::new();
        loop {
            match lines.next(Duration::from_secs(5)) {
                NextLine::Line(l) => out.push(l),
                NextLine::Idle => panic!("reader stalled"),
                NextLine::Failed(e) => panic!("unexpected error: {e}"),
                NextLine::Closed => break,
            }
        }
        lines.join();
        out
    }

    #[test]
    fn splits_on_newline_and_carriage_return() {
        let out = Cursor::new(b"out_time=00:00:01.00\nprogress=continue\n".to_vec());
        let err = Cursor::new(b"size= 1kB time=00:00:01.00\rsize= 2kB time=00:00:02.00\r\ntail".to_vec());
        let mut got = collect(MergedLines::spawn(out, err));
        got.sort();
        assert_eq!(
            got,
            [
                "out_time=00:00:01.00",
                "progress=continue",
                "size= 1kB time=00:00:01.00",
                "size= 2kB time=00:00:02.00",
                "tail",
            ]
        );
    }

    #[test]
    fn invalid_utf8_is_lossy_not_an_error() {
        let out = Cursor::new(b"title=\xff\xfe\n".to_vec());
        let got = collect(MergedLines::spawn(out, Cursor::new(Vec::new())));
        assert_eq!(got.len(), 1);
        assert!(got[0].starts_with("title="));
    }

    struct BrokenPipe {
        sent_line: bool,
    }

    impl Read for BrokenPipe {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.sent_line {
                self.sent_line = true;
                let line = b"Duration: 00:00:04.00\n";
                buf[..line.len()].copy_from_slice(line);
                return Ok(line.len());
            }
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe torn down"))
        }
    }

    #[test]
    fn read_error_is_forwarded_after_earlier_lines() {
        let lines = MergedLines::spawn(BrokenPipe { sent_line: false }, Cursor::new(Vec::new()));
        let mut got = Vec::new();
        let err = loop {
            match lines.next(Duration::from_secs(5)) {
                NextLine::Line(l) => got.push(l),
                NextLine::Idle => panic!("reader stalled"),
                NextLine::Failed(e) => break e,
                NextLine::Closed => panic!("error was swallowed"),
            }
        };
        assert_eq!(got, ["Duration: 00:00:04.00"]);
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
