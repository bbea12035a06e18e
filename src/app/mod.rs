pub mod args;
mod setup;
mod traffic;

pub use args::AppArgs;

use anyhow::{bail, Result};
use tracing::info;
use webview_logger::{viewer_info, LogOptions};

pub async fn launch() -> Result<()> {
    launch_with_args(AppArgs::from_cli()).await
}

pub async fn launch_with_args(args: AppArgs) -> Result<()> {
    let logger = setup::prepare(&args)?;

    if !logger.initialize() {
        bail!("failed to start the log viewer on port {}", logger.port());
    }
    setup::print_start_banner(&logger);

    viewer_info!(logger, "Demo started with {:?} records", args.count);
    if let Err(e) = "not a number".parse::<u32>() {
        logger.log_exception(&e, None, LogOptions::new().source("Demo"));
    }

    tokio::select! {
        _ = traffic::generate(&logger, &args) => {
            info!("Finished generating records");
        }
        result = tokio::signal::ctrl_c() => {
            result?;
            info!("Interrupted, shutting down");
        }
    }

    logger.shutdown();
    Ok(())
}
