//! Pending bulk URL list persisted between runs as JSON.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub urls: Vec<String>,
}

impl Session {
    /// `~/.local/state/hlsconv/session.json`.
    pub fn default_path() -> Result<PathBuf> {
        let xdg_dirs = xdg::BaseDirectories::with_prefix("hlsconv")?;
        Ok(xdg_dirs.place_state_file("session.json")?)
    }

    /// Load from `path`; a missing file is an empty session.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e).with_context(|| format!("read session {}", path.display())),
        };
        serde_json::from_str(&data).with_context(|| format!("parse session {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("write session {}", path.display()))?;
        Ok(())
    }

    /// Remove the session file. Missing file is fine.
    pub fn clear(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("remove session {}", path.display())),
        }
    }

    /// Append URLs, skipping blanks and ones already present. Returns how many were added.
    pub fn extend<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.urls.len();
        for url in urls {
            let url = url.as_ref().trim();
            if !url.is_empty() && !self.urls.iter().any(|u| u == url) {
                self.urls.push(url.to_string());
            }
        }
        self.urls.len() - before
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_load_clear() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        assert_eq!(Session::load(&path).unwrap(), Session::default());

        let mut session = Session::default();
        assert_eq!(session.extend(["https://a/1.m3u8", " ", "https://a/2.m3u8", "https://a/1.m3u8"]), 2);
        session.save(&path).unwrap();
        assert_eq!(Session::load(&path).unwrap().urls, ["https://a/1.m3u8", "https://a/2.m3u8"]);

        Session::clear(&path).unwrap();
        assert!(!path.exists());
        Session::clear(&path).unwrap();
    }

    #[test]
    fn tolerates_missing_urls_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{}").unwrap();
        assert!(Session::load(&path).unwrap().urls.is_empty());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(Session::load(&path).is_err());
    }
}
