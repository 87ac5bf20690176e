use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default number of concurrent conversion workers.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Default upper bound on how long a job waits for output before re-checking cancellation.
pub const DEFAULT_CANCEL_POLL_MS: u64 = 200;

/// Global configuration loaded from `~/.config/hlsconv/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HlsconvConfig {
    /// Maximum number of conversion jobs running at once in bulk mode.
    pub max_workers: usize,
    /// Transcoder executable (name on PATH or absolute path).
    pub transcoder: String,
    /// Container extension for generated output names, without the dot.
    pub output_extension: String,
    /// Root directory for bulk output folders (None = `~/Downloads`).
    #[serde(default)]
    pub output_root: Option<PathBuf>,
    /// Cancellation poll interval in milliseconds while the transcoder is silent.
    #[serde(default)]
    pub cancel_poll_ms: Option<u64>,
}

impl Default for HlsconvConfig {
    fn default() -> Self {
        Self {
            max_workers: DEFAULT_MAX_WORKERS,
            transcoder: "ffmpeg".to_string(),
            output_extension: "mp4".to_string(),
            output_root: None,
            cancel_poll_ms: None,
        }
    }
}

impl HlsconvConfig {
    /// Worker count, never below one.
    pub fn workers(&self) -> usize {
        self.max_workers.max(1)
    }

    pub fn cancel_poll_interval(&self) -> Duration {
        Duration::from_millis(self.cancel_poll_ms.unwrap_or(DEFAULT_CANCEL_POLL_MS).max(1))
    }

    /// Effective bulk output root: configured value or `$HOME/Downloads`.
    pub fn resolved_output_root(&self) -> PathBuf {
        if let Some(root) = &self.output_root {
            return root.clone();
        }
        std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("Downloads")
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("hlsconv")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<HlsconvConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = HlsconvConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: HlsconvConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}
