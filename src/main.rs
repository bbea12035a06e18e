//! The entry point of the log viewer demo.
mod app;

use anyhow::Result;

/// Starts the viewer and streams random records to it until the requested
/// count is reached or Ctrl-C is pressed.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the viewer cannot
/// be started.
#[tokio::main]
async fn main() -> Result<()> {
    app::launch().await
}
