//! `hlsconv history` – list converted URLs.

use anyhow::Result;
use hlsconv_core::history::UrlHistory;

pub fn run_history() -> Result<()> {
    let urls = UrlHistory::open_default()?.load_all()?;
    if urls.is_empty() {
        println!("No URLs in history.");
    }
    for url in urls {
        println!("{}", url);
    }
    Ok(())
}
