//! CLI for the hlsconv stream converter.

mod commands;
mod control_socket;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hlsconv_core::config;
use std::path::PathBuf;

use commands::{
    run_bulk, run_cancel, run_clean, run_convert, run_export_csv, run_history, run_session,
};

/// Top-level CLI for hlsconv.
#[derive(Debug, Parser)]
#[command(name = "hlsconv")]
#[command(about = "hlsconv: convert HLS streams to local files with a stream-copy transcoder", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Convert a single stream URL (or local playlist) to a file.
    Convert {
        /// Stream URL or local path.
        source: String,
        /// Output file (default: name derived from the source, in the output root).
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Convert many streams concurrently into a numbered output folder.
    Bulk {
        /// CSV or TXT file with one URL per row (first column). Repeatable.
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<PathBuf>,
        /// Base name for the output folder and files.
        #[arg(long, default_value = "batch")]
        name: String,
        /// Concurrent conversions (default from config).
        #[arg(long, value_name = "N")]
        workers: Option<usize>,
        /// URLs to convert. With no files or URLs, the saved session is used.
        urls: Vec<String>,
    },

    /// Cancel the bulk conversion running in another terminal.
    Cancel,

    /// Manage the saved list of pending bulk URLs.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Print every URL converted successfully so far.
    History,

    /// Write URLs to a one-column CSV file.
    ExportCsv {
        /// Destination CSV file.
        output: PathBuf,
        /// URLs to export.
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Delete a bulk output folder and its contents.
    Clean {
        /// Base name used for the bulk run.
        #[arg(long)]
        name: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum SessionAction {
    /// Append URLs (and/or URLs from CSV/TXT files) to the session.
    Add {
        #[arg(long = "file", value_name = "PATH")]
        files: Vec<PathBuf>,
        urls: Vec<String>,
    },
    /// Show the saved URLs.
    List,
    /// Forget the saved URLs.
    Clear,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Convert { source, output } => run_convert(&cfg, &source, output).await?,
            CliCommand::Bulk {
                files,
                name,
                workers,
                urls,
            } => run_bulk(&cfg, &files, &name, workers, urls).await?,
            CliCommand::Cancel => run_cancel().await?,
            CliCommand::Session { action } => run_session(action)?,
            CliCommand::History => run_history()?,
            CliCommand::ExportCsv { output, urls } => run_export_csv(&output, &urls)?,
            CliCommand::Clean { name } => run_clean(&cfg, &name).await?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
