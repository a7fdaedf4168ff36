//! ntfy-wrapper - push notifications from the command line
//!
//! Sends notifications through an ntfy server to the topics and emails listed
//! in a local INI configuration file.

use anyhow::Result;
use clap::Parser;
use ntfy_wrapper::{cli::Cli, commands, config::Settings};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Layer defaults, environment and CLI arguments.
    let settings = Settings::load(&cli).unwrap_or_else(|err| {
        // Logging is not configured yet, fall back to the default filter.
        init_logging("warn");
        error!("Failed to load settings: {}", err);
        std::process::exit(1);
    });

    init_logging(&settings.log_level);
    info!(
        conf_path = %settings.conf_path.display(),
        base_url = settings.base_url.as_deref().unwrap_or("<from config file>"),
        debug = settings.debug,
        "ntfy-wrapper starting"
    );

    match commands::run(cli.command, &settings).await {
        Ok(code) => Ok(code),
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("Error: {e:#}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
