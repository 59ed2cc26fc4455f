//! Create a new work-dir.
//!
//! ```bash
//! # Use the default server of ~/.glbulk/config.toml
//! glbulk init team/backend backend
//!
//! # Pick a named server, or give the connection directly
//! glbulk init team/backend backend --server work
//! glbulk init team/backend backend --url https://gitlab.example.com --private-token glpat-xxx
//! ```
//!
//! The new directory gets a `.gitlab` file whose `origin` table holds the
//! server settings; the process must not already be inside a work-dir.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use super::CliConfig;
use super::common::CommandOutcome;
use crate::config::{GlobalConfig, ServerConfig};
use crate::utils::resolve_path;
use crate::workdir::WorkdirContext;

/// Initialize a work-dir mirroring a GitLab group.
#[derive(Args, Debug, Clone)]
pub struct InitCommand {
    /// Group the work-dir root mirrors
    pub group_path: String,

    /// Directory to create
    pub workdir_name: String,

    /// Server name from the global configuration
    #[arg(long, conflicts_with = "url")]
    pub server: Option<String>,

    /// Server URL, instead of a configured server
    #[arg(long)]
    pub url: Option<String>,

    /// Private token to store with `--url`
    #[arg(long, requires = "url")]
    pub private_token: Option<String>,
}

impl InitCommand {
    async fn server_config(&self, config: &CliConfig) -> Result<ServerConfig> {
        if let Some(url) = &self.url {
            let mut server = ServerConfig::new(url.clone());
            server.private_token.clone_from(&self.private_token);
            return Ok(server);
        }
        let path = config.config_path.as_deref().map(resolve_path).transpose()?;
        let global = GlobalConfig::load_with_optional(path).await?;
        let (name, server) = global.server(self.server.as_deref())?;
        tracing::debug!("Using server '{}' ({})", name, server.url);
        Ok(server.clone())
    }

    pub async fn execute(self, config: &CliConfig) -> Result<CommandOutcome> {
        let cwd = std::env::current_dir().context("Failed to read the current directory")?;
        WorkdirContext::ensure_not_nested(&cwd)?;
        let server = self.server_config(config).await?;
        let ctx = WorkdirContext::init(&cwd, &self.group_path, &self.workdir_name, &server).await?;

        if !config.is_quiet() {
            println!(
                "{} Initialized work-dir {} for group '{}'",
                "✓".green(),
                ctx.root().display(),
                ctx.base_group()
            );
            println!("\n{}", "Next steps:".cyan());
            println!("  cd {}", self.workdir_name);
            println!("  {} to check out every project", "glbulk clone".bright_white());
        }
        Ok(CommandOutcome::Clean)
    }
}
