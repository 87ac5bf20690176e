//! Integration tests: ConversionJob against a scripted transcoder.
#![cfg(unix)]

mod common;

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use common::fake_transcoder;
use hlsconv_core::control::CancellationSignal;
use hlsconv_core::job::{ConversionJob, JobPhase, JobSpec, TranscodeCommand};
use tempfile::tempdir;

#[derive(Debug, Clone, PartialEq)]
enum Report {
    Progress(f64),
    Complete(bool),
}

fn recorded_job(
    spec: JobSpec,
    tool: &std::path::Path,
    cancel: CancellationSignal,
) -> (ConversionJob, Arc<Mutex<Vec<Report>>>) {
    let reports = Arc::new(Mutex::new(Vec::new()));
    let progress = Arc::clone(&reports);
    let complete = Arc::clone(&reports);
    let job = ConversionJob::new(spec, TranscodeCommand::new(tool.to_string_lossy()), cancel)
        .with_poll_interval(Duration::from_millis(20))
        .on_progress(move |p| progress.lock().unwrap().push(Report::Progress(p)))
        .on_complete(move |ok| complete.lock().unwrap().push(Report::Complete(ok)));
    (job, reports)
}

#[test]
fn successful_job_reports_progress_then_one_completion() {
    let dir = tempdir().unwrap();
    let tool = fake_transcoder::install(dir.path());
    let dest = dir.path().join("out/ok.mp4");
    let (job, reports) = recorded_job(JobSpec::new("ok", &dest), &tool, CancellationSignal::new());

    let outcome = job.run();

    assert_eq!(outcome.phase, JobPhase::Succeeded);
    assert_eq!(outcome.last_percent, Some(100.0));
    assert!(dest.exists(), "destination directory is created and written");
    let reports = reports.lock().unwrap().clone();
    assert_eq!(reports.last(), Some(&Report::Complete(true)));
    assert_eq!(
        reports.iter().filter(|r| matches!(r, Report::Complete(_))).count(),
        1
    );
    let progress: Vec<f64> = reports
        .iter()
        .filter_map(|r| match r {
            Report::Progress(p) => Some(*p),
            Report::Complete(_) => None,
        })
        .collect();
    assert!(progress.contains(&25.0));
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "monotonic: {progress:?}");
    assert!(progress.iter().all(|p| (0.0..=100.0).contains(p)));
}

#[test]
fn unknown_duration_still_succeeds_without_progress() {
    let dir = tempdir().unwrap();
    let tool = fake_transcoder::install(dir.path());
    let (job, reports) = recorded_job(
        JobSpec::new("nodur", dir.path().join("nodur.mp4")),
        &tool,
        CancellationSignal::new(),
    );
    let outcome = job.run();
    assert_eq!(outcome.phase, JobPhase::Succeeded);
    assert_eq!(*reports.lock().unwrap(), vec![Report::Complete(true)]);
}

#[test]
fn nonzero_exit_reports_failure() {
    let dir = tempdir().unwrap();
    let tool = fake_transcoder::install(dir.path());
    let (job, reports) = recorded_job(
        JobSpec::new("fail", dir.path().join("fail.mp4")),
        &tool,
        CancellationSignal::new(),
    );
    let outcome = job.run();
    assert_eq!(outcome.phase, JobPhase::Failed);
    let reports = reports.lock().unwrap().clone();
    assert_eq!(reports.last(), Some(&Report::Complete(false)));
    assert_eq!(reports.len(), 2, "one progress report then completion: {reports:?}");
}

#[test]
fn cancelled_before_run_never_launches() {
    let dir = tempdir().unwrap();
    let tool = fake_transcoder::install(dir.path());
    let dest = dir.path().join("never.mp4");
    let cancel = CancellationSignal::new();
    cancel.cancel();
    let (job, reports) = recorded_job(JobSpec::new("ok", &dest), &tool, cancel);

    let outcome = job.run();

    assert_eq!(outcome.phase, JobPhase::Cancelled);
    assert!(!fake_transcoder::was_started(&dest));
    assert_eq!(*reports.lock().unwrap(), vec![Report::Complete(false)]);
}

#[test]
fn cancel_while_running_terminates_promptly() {
    let dir = tempdir().unwrap();
    let tool = fake_transcoder::install(dir.path());
    let dest = dir.path().join("slow.mp4");
    let cancel = CancellationSignal::new();
    let (job, reports) = recorded_job(JobSpec::new("slow", &dest), &tool, cancel.clone());

    let runner = thread::spawn(move || job.run());
    let deadline = Instant::now() + Duration::from_secs(10);
    while reports.lock().unwrap().is_empty() {
        assert!(Instant::now() < deadline, "no progress from slow job");
        thread::sleep(Duration::from_millis(10));
    }
    let cancelled_at = Instant::now();
    cancel.cancel();
    let outcome = runner.join().unwrap();

    assert!(cancelled_at.elapsed() < Duration::from_secs(5));
    assert_eq!(outcome.phase, JobPhase::Cancelled);
    assert!(fake_transcoder::was_started(&dest));
    let reports = reports.lock().unwrap().clone();
    assert_eq!(reports.last(), Some(&Report::Complete(false)));
}

#[test]
fn cancel_observed_while_transcoder_is_silent() {
    let dir = tempdir().unwrap();
    let tool = fake_transcoder::install(dir.path());
    let dest = dir.path().join("silent.mp4");
    let cancel = CancellationSignal::new();
    let (job, reports) = recorded_job(JobSpec::new("silent", &dest), &tool, cancel.clone());

    let runner = thread::spawn(move || job.run());
    let deadline = Instant::now() + Duration::from_secs(10);
    while !fake_transcoder::was_started(&dest) {
        assert!(Instant::now() < deadline, "silent job never started");
        thread::sleep(Duration::from_millis(10));
    }
    cancel.cancel();
    cancel.cancel();
    let outcome = runner.join().unwrap();

    assert_eq!(outcome.phase, JobPhase::Cancelled);
    assert_eq!(*reports.lock().unwrap(), vec![Report::Complete(false)]);
}

#[test]
fn panicking_progress_callback_fails_the_job_and_reaps_the_child() {
    let dir = tempdir().unwrap();
    let tool = fake_transcoder::install(dir.path());
    let dest = dir.path().join("panic.mp4");
    let completions = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&completions);
    let job = ConversionJob::new(
        JobSpec::new("slow", &dest),
        TranscodeCommand::new(tool.to_string_lossy()),
        CancellationSignal::new(),
    )
    .with_poll_interval(Duration::from_millis(20))
    .on_progress(|_| panic!("progress sink broke"))
    .on_complete(move |ok| seen.lock().unwrap().push(ok));

    let started = Instant::now();
    let outcome = job.run();

    assert_eq!(outcome.phase, JobPhase::Failed);
    assert_eq!(*completions.lock().unwrap(), vec![false]);
    assert!(fake_transcoder::was_started(&dest));
    // "slow" never exits by itself; returning means the child was killed and waited on.
    assert!(started.elapsed() < Duration::from_secs(10), "took {:?}", started.elapsed());
}
