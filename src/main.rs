//! glbulk CLI entry point
//!
//! Parses the command line, runs the command and maps the outcome to the
//! process exit status: 0 when clean, 1 when findings were reported or the
//! command failed.

use anyhow::Result;
use clap::Parser;
use glbulk_cli::cli;
use glbulk_cli::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(outcome) => std::process::exit(outcome.exit_code()),
        Err(e) => {
            let error_ctx = user_friendly_error(e);
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
