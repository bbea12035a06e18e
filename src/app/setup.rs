//! This module handles the initial setup of the demo.
use super::args::AppArgs;
use anyhow::{anyhow, Result};
use std::sync::Arc;
use webview_logger::{Fallback, Logger, LoggerConfig, ViewerLayer};

/// Builds the logger from the environment and the command line, and
/// installs the tracing subscriber that feeds it.
pub fn prepare(args: &AppArgs) -> Result<Arc<Logger>> {
    let config = build_config(args)?;
    let logger = Arc::new(Logger::new(config));

    ViewerLayer::init_subscriber(logger.clone())
        .map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))?;

    Ok(logger)
}

fn build_config(args: &AppArgs) -> Result<LoggerConfig> {
    let mut config = LoggerConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if args.no_recover {
        config.auto_recover = false;
    }
    if args.console {
        config.fallback = Fallback::Console;
    }
    Ok(config)
}

/// Prints a banner with startup information.
pub fn print_start_banner(logger: &Logger) {
    println!("Log viewer demo");
    println!("Viewer: {}", logger.viewer_url());
    println!(
        "Auto recovery: {}",
        if logger.auto_recover() { "on" } else { "off" }
    );
    println!("Press Ctrl-C to stop");
    println!();
}
