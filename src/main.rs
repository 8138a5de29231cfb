mod cli;
mod config;
mod error;
mod model;
mod preview;
mod prompt;
mod providers;
mod reader;
mod submit;
mod util;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr so they never mix with the preview on stdout
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli::run(cli).await {
        Ok(outcome) => {
            tracing::debug!(?outcome, "run finished");
            outcome.exit_code()
        }
        Err(err) => {
            tracing::error!(error = %err, "import failed");
            eprintln!("Error: {err}");
            err.exit_code()
        }
    }
}
