//! CLI command handlers, one file per command.

mod bulk;
mod cancel;
mod clean;
mod convert;
mod export_csv;
mod history;
mod session;

pub use bulk::run_bulk;
pub use cancel::run_cancel;
pub use clean::run_clean;
pub use convert::run_convert;
pub use export_csv::run_export_csv;
pub use history::run_history;
pub use session::run_session;

use hlsconv_core::import::import_url_files;
use std::path::PathBuf;

/// URLs from `files` followed by `urls`. Unreadable files are reported and skipped.
pub(crate) fn collect_sources(files: &[PathBuf], urls: Vec<String>) -> Vec<String> {
    let (mut sources, errors) = import_url_files(files);
    for err in errors {
        eprintln!("Skipping {}", err);
    }
    sources.extend(urls.into_iter().map(|u| u.trim().to_string()).filter(|u| !u.is_empty()));
    sources
}
