//! `errors`, `status` and `ci-status`.

use anyhow::Result;
use clap::Args;

use super::CliConfig;
use super::common::{CommandOutcome, open_operations, print_output, print_report};
use crate::bulk::{StatusOptions, fold_ci_errors};

/// Report consistency problems of the local repositories.
#[derive(Args, Debug, Clone)]
pub struct ErrorsCommand {
    /// Group path; defaults to the work-dir's base group
    pub group_path: Option<String>,

    /// Branch every repository is expected to have checked out
    #[arg(short, long)]
    pub branch: Option<String>,
}

impl ErrorsCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<CommandOutcome> {
        let ops = open_operations(config).await?;
        let report = ops.errors(self.group_path.as_deref(), self.branch.as_deref()).await?;
        print_report(&report, config.format)
    }
}

/// Summarize the local work-dir and compare it with the server.
#[derive(Args, Debug, Clone)]
pub struct StatusCommand {
    /// Group path; defaults to the work-dir's base group
    pub group_path: Option<String>,

    /// Branch every repository is expected to have checked out
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Only look at the local repositories
    #[arg(long)]
    pub no_remote: bool,

    /// Also list projects whose latest pipeline failed
    #[arg(long, conflicts_with = "no_remote")]
    pub ci: bool,
}

impl StatusCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<CommandOutcome> {
        let ops = open_operations(config).await?;
        let options = StatusOptions {
            branch: self.branch,
            no_remote: self.no_remote,
            ci: self.ci,
        };
        let report = ops.status(self.group_path.as_deref(), &options).await?;
        print_report(&report, config.format)
    }
}

/// Classify the latest CI pipeline of every remote project.
#[derive(Args, Debug, Clone)]
pub struct CiStatusCommand {
    /// Group path; defaults to the work-dir's base group
    pub group_path: Option<String>,

    /// Only consider branch pipelines of this ref
    #[arg(short, long)]
    pub branch: Option<String>,
}

impl CiStatusCommand {
    /// Exits with status 1 when any project's pipeline failed.
    pub async fn execute(self, config: &CliConfig) -> Result<CommandOutcome> {
        let ops = open_operations(config).await?;
        let labels = ops.ci_status(self.group_path.as_deref(), self.branch.as_deref()).await?;
        print_output(&labels, config.format)?;
        Ok(if fold_ci_errors(&labels).is_empty() {
            CommandOutcome::Clean
        } else {
            CommandOutcome::Findings
        })
    }
}
