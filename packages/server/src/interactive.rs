//! Interactive mode for the server.
//!
//! Prompts for the data directory, bind address and port, then loads the
//! dataset and starts the server.

use std::sync::Arc;

use dialoguer::{Confirm, Input};
use streetcar_delay_dataset::{DataPaths, DelayDataset};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Sets `BIND_ADDR` and `PORT` from the answers and delegates to
/// [`super::run_server`].
///
/// # Errors
///
/// Returns an `std::io::Result` error if the dataset cannot be loaded or
/// the server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> std::io::Result<()> {
    println!("Streetcar Delay Server");
    println!();

    let default_dir = DataPaths::from_env().data_dir().display().to_string();
    let data_dir: String = Input::new()
        .with_prompt("Data directory")
        .default(default_dir.clone())
        .interact_text()
        .unwrap_or(default_dir);

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default("127.0.0.1".to_string())
        .interact_text()
        .unwrap_or_else(|_| "127.0.0.1".to_string());

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(8080)
        .interact_text()
        .unwrap_or(8080);

    if !Confirm::new()
        .with_prompt(format!("Serve {data_dir} on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    // SAFETY: No other threads read the environment yet; the server reads
    // these once while binding.
    unsafe {
        std::env::set_var("BIND_ADDR", &bind_addr);
        std::env::set_var("PORT", port.to_string());
    }

    let dataset = DelayDataset::load(&DataPaths::new(data_dir)).map_err(std::io::Error::other)?;

    super::run_server(Arc::new(dataset)).await
}
