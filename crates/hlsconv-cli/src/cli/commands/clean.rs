//! `hlsconv clean` – delete a bulk output folder.

use anyhow::{bail, Result};
use hlsconv_core::batch::remove_output_dir;
use hlsconv_core::config::HlsconvConfig;
use hlsconv_core::control::default_control_socket_path;
use hlsconv_core::url_model::sanitize_filename_for_linux;

use crate::cli::control_socket;

pub async fn run_clean(cfg: &HlsconvConfig, name: &str) -> Result<()> {
    let base = sanitize_filename_for_linux(name.trim());
    if base.is_empty() {
        bail!("invalid base name: {:?}", name);
    }
    let socket_path = default_control_socket_path()?;
    if control_socket::is_listening(&socket_path).await {
        bail!("a bulk conversion is running; cancel it first");
    }
    let dir = cfg.resolved_output_root().join(base);
    remove_output_dir(&dir)?;
    println!("Removed {}", dir.display());
    Ok(())
}
