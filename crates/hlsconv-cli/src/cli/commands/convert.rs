//! `hlsconv convert` – one stream to one file.

use anyhow::{bail, Result};
use hlsconv_core::config::HlsconvConfig;
use hlsconv_core::control::CancellationSignal;
use hlsconv_core::history::UrlHistory;
use hlsconv_core::job::{ConversionJob, JobPhase, JobSpec, TranscodeCommand};
use hlsconv_core::url_model::default_output_name;
use std::io::Write;
use std::path::PathBuf;

pub async fn run_convert(cfg: &HlsconvConfig, source: &str, output: Option<PathBuf>) -> Result<()> {
    let destination = output.unwrap_or_else(|| {
        cfg.resolved_output_root()
            .join(default_output_name(source, &cfg.output_extension))
    });
    println!("Converting {} -> {}", source, destination.display());

    let cancel = CancellationSignal::new();
    let job = ConversionJob::new(
        JobSpec::new(source, destination.clone()),
        TranscodeCommand::new(cfg.transcoder.clone()),
        cancel.clone(),
    )
    .with_poll_interval(cfg.cancel_poll_interval())
    .on_progress(|percent| {
        print!("\r  {:.1}%  ", percent);
        let _ = std::io::stdout().flush();
    });

    let mut task = tokio::task::spawn_blocking(move || job.run());
    let outcome = tokio::select! {
        res = &mut task => res?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nCancelling...");
            cancel.cancel();
            task.await?
        }
    };
    println!();

    match outcome.phase {
        JobPhase::Succeeded => {
            println!("Done: {}", destination.display());
            if let Err(e) = UrlHistory::open_default().and_then(|h| h.save(source)) {
                tracing::warn!("could not record {} in history: {:#}", source, e);
            }
            Ok(())
        }
        JobPhase::Cancelled => bail!("conversion cancelled"),
        _ => bail!("conversion failed (see log for transcoder output)"),
    }
}
