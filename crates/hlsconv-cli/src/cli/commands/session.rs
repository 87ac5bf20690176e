//! `hlsconv session` – pending bulk URLs kept between runs.

use anyhow::Result;
use hlsconv_core::session::Session;

use super::collect_sources;
use crate::cli::SessionAction;

pub fn run_session(action: SessionAction) -> Result<()> {
    let path = Session::default_path()?;
    match action {
        SessionAction::Add { files, urls } => {
            let mut session = Session::load(&path)?;
            let added = session.extend(collect_sources(&files, urls));
            session.save(&path)?;
            println!("Added {} URL(s); {} in session.", added, session.urls.len());
        }
        SessionAction::List => {
            let session = Session::load(&path)?;
            if session.urls.is_empty() {
                println!("Session is empty.");
            }
            for (i, url) in session.urls.iter().enumerate() {
                println!("{:>4}  {}", i + 1, url);
            }
        }
        SessionAction::Clear => {
            Session::clear(&path)?;
            println!("Session cleared.");
        }
    }
    Ok(())
}
