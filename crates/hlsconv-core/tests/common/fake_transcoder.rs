//! Shell script standing in for the transcoder in integration tests.
//!
//! Called like the real tool (`-i <source> ... <destination>`); the source
//! string picks the behaviour. Every launch touches `<destination>.started`
//! so tests can tell whether a process was ever spawned.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const SCRIPT: &str = r#"#!/bin/sh
src="$2"
dest="${10}"
: > "$dest.started"
case "$src" in
  ok)
    echo "Input #0, hls, from 'ok':" >&2
    echo "  Duration: 00:02:00.00, start: 0.000000, bitrate: N/A" >&2
    sleep 0.1
    echo "out_time=00:00:30.000000"
    echo "progress=continue"
    sleep 0.1
    printf 'frame=  50 fps=0.0 size=  256kB time=00:01:00.00 bitrate=N/A\r' >&2
    sleep 0.1
    echo "out_time=00:02:00.000000"
    echo "progress=end"
    : > "$dest"
    exit 0
    ;;
  brief)
    echo "  Duration: 00:00:10.00, start: 0.000000" >&2
    sleep 0.2
    echo "out_time=00:00:10.000000"
    : > "$dest"
    exit 0
    ;;
  nodur)
    echo "out_time=00:00:05.000000"
    echo "progress=end"
    : > "$dest"
    exit 0
    ;;
  fail)
    echo "  Duration: 00:01:00.00, start: 0.000000" >&2
    sleep 0.1
    echo "out_time=00:00:10.000000"
    echo "ok.m3u8: Invalid data found when processing input" >&2
    exit 1
    ;;
  slow)
    echo "  Duration: 01:00:00.00, start: 0.000000" >&2
    while true; do
      echo "out_time=00:00:01.000000"
      sleep 0.05
    done
    ;;
  silent)
    exec sleep 30
    ;;
  *)
    echo "unknown source $src" >&2
    exit 2
    ;;
esac
"#;

/// Write the script into `dir` and return its path.
pub fn install(dir: &Path) -> PathBuf {
    let path = dir.join("fake-transcoder.sh");
    fs::write(&path, SCRIPT).expect("write fake transcoder");
    let mut perms = fs::metadata(&path).expect("stat fake transcoder").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("chmod fake transcoder");
    path
}

/// Whether the fake transcoder was launched for `destination`.
pub fn was_started(destination: &Path) -> bool {
    let mut marker = destination.as_os_str().to_owned();
    marker.push(".started");
    Path::new(&marker).exists()
}
