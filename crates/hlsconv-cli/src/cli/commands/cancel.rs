//! `hlsconv cancel` – stop the bulk run of another process.

use anyhow::Result;
use hlsconv_core::control::default_control_socket_path;

use crate::cli::control_socket;

pub async fn run_cancel() -> Result<()> {
    let socket_path = default_control_socket_path()?;
    if control_socket::send_cancel(&socket_path).await? {
        println!("Cancellation requested.");
    } else {
        println!("No bulk conversion is running.");
    }
    Ok(())
}
