//! URL-list ingestion from `.csv` / `.txt` files and one-column CSV export.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Header written by [`export_urls_csv`].
pub const CSV_HEADER: &str = "M3U8 URLs";

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("unsupported file type: {}", .0.display())]
    UnsupportedFile(PathBuf),
    #[error("{}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no URLs to export")]
    NothingToExport,
    #[error("write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListFormat {
    /// First row is a header.
    Csv,
    /// One entry per line, no header.
    Text,
}

fn list_format(path: &Path) -> Option<ListFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "csv" => Some(ListFormat::Csv),
        "txt" => Some(ListFormat::Text),
        _ => None,
    }
}

/// First field of a CSV row, with surrounding quotes removed.
fn first_column(row: &str) -> &str {
    let row = row.trim();
    let field = if let Some(rest) = row.strip_prefix('"') {
        rest.split('"').next().unwrap_or("")
    } else {
        row.split(',').next().unwrap_or("")
    };
    field.trim()
}

/// URLs from the first column of one file, skipping blank cells.
pub fn read_url_file(path: &Path) -> Result<Vec<String>, ImportError> {
    let format = list_format(path).ok_or_else(|| ImportError::UnsupportedFile(path.to_path_buf()))?;
    let data = fs::read_to_string(path).map_err(|source| ImportError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let skip = usize::from(format == ListFormat::Csv);
    Ok(data
        .lines()
        .skip(skip)
        .map(first_column)
        .filter(|cell| !cell.is_empty())
        .map(String::from)
        .collect())
}

/// Concatenate the URLs of every readable file in order. Files that fail are
/// logged and skipped; their errors are returned alongside the URLs.
pub fn import_url_files<P: AsRef<Path>>(paths: &[P]) -> (Vec<String>, Vec<ImportError>) {
    let mut urls = Vec::new();
    let mut errors = Vec::new();
    for path in paths {
        match read_url_file(path.as_ref()) {
            Ok(found) => {
                tracing::debug!(path = %path.as_ref().display(), count = found.len(), "imported URL list");
                urls.extend(found);
            }
            Err(e) => {
                tracing::error!("failed to process URL list: {}", e);
                errors.push(e);
            }
        }
    }
    (urls, errors)
}

/// Write `urls` as a one-column CSV with a header row.
pub fn export_urls_csv<S: AsRef<str>>(urls: &[S], path: &Path) -> Result<(), ImportError> {
    if urls.iter().all(|u| u.as_ref().trim().is_empty()) {
        return Err(ImportError::NothingToExport);
    }
    let write_err = |source| ImportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut out = io::BufWriter::new(fs::File::create(path).map_err(write_err)?);
    writeln!(out, "{}", CSV_HEADER).map_err(write_err)?;
    for url in urls.iter().map(|u| u.as_ref().trim()).filter(|u| !u.is_empty()) {
        if url.contains(',') || url.contains('"') {
            writeln!(out, "\"{}\"", url.replace('"', "\"\"")).map_err(write_err)?;
        } else {
            writeln!(out, "{}", url).map_err(write_err)?;
        }
    }
    out.flush().map_err(write_err)?;
    Ok(())
}
