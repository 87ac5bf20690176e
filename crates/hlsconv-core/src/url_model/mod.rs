//! Source locators and output filename derivation.
//!
//! Derives a safe local output name from a stream URL (or local path) for
//! single-job mode, sanitized for Linux filesystems.

mod path;
mod sanitize;

pub use path::{filename_from_source, is_remote_url};
pub use sanitize::sanitize_filename_for_linux;

/// Stem used when the source yields nothing usable.
const DEFAULT_STEM: &str = "output";

/// Derives `<stem>.<extension>` for a single conversion.
///
/// The stem is the last path segment of `source` without its extension
/// (`.../index.m3u8` → `index`), sanitized; falls back to `output`.
///
/// # Examples
///
/// - `default_output_name("https://cdn.example.com/show/master.m3u8", "mp4")` → `"master.mp4"`
/// - `default_output_name("https://cdn.example.com/", "mp4")` → `"output.mp4"`
pub fn default_output_name(source: &str, extension: &str) -> String {
    let extension = extension.trim_start_matches('.');
    let stem = filename_from_source(source)
        .map(|name| match name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem.to_string(),
            _ => name,
        })
        .map(|stem| sanitize_filename_for_linux(&stem))
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .unwrap_or_else(|| DEFAULT_STEM.to_string());
    format!("{}.{}", stem, extension)
}
