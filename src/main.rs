mod backend;
mod catalog;
mod cli;
mod discovery;
mod logging;
mod model;
mod orchestrator;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_headless = args.is_headless();

    let log_path = args
        .log_file
        .clone()
        .unwrap_or_else(logging::default_log_path);
    logging::init_or_warn(&log_path);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "odk-shell starting");

    match cli::run(args).await {
        Ok(code) => {
            // Headless modes report the invocation outcome through the exit status.
            if is_headless {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "odk-shell failed");
            Err(e)
        }
    }
}
