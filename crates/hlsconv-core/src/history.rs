//! Append-only log of successfully converted source URLs.

use anyhow::{Context, Result};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// One URL per line in a plain text file. Duplicates are never written.
#[derive(Debug, Clone)]
pub struct UrlHistory {
    path: PathBuf,
}

impl UrlHistory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.local/state/hlsconv/url_log.txt`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("hlsconv")?;
        Ok(xdg_dirs.place_state_file("url_log.txt")?)
    }

    pub fn open_default() -> Result<Self> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `url` unless it is already recorded. Returns true if it was written.
    pub fn save(&self, url: &str) -> Result<bool> {
        let url = url.trim();
        if url.is_empty() || self.exists(url)? {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("open history {}", self.path.display()))?;
        writeln!(file, "{}", url)?;
        tracing::debug!(%url, "saved to history");
        Ok(true)
    }

    pub fn exists(&self, url: &str) -> Result<bool> {
        let url = url.trim();
        Ok(self.load_all()?.iter().any(|u| u == url))
    }

    /// All recorded URLs in insertion order; empty if the file does not exist yet.
    pub fn load_all(&self) -> Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(data) => Ok(data
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(String::from)
                .collect()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("read history {}", self.path.display())),
        }
    }
}
