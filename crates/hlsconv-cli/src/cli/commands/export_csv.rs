//! `hlsconv export-csv` – write URLs to a CSV file.

use anyhow::Result;
use hlsconv_core::import::export_urls_csv;
use std::path::Path;

pub fn run_export_csv(output: &Path, urls: &[String]) -> Result<()> {
    export_urls_csv(urls, output)?;
    println!("Exported {} URL(s) to {}", urls.len(), output.display());
    Ok(())
}
