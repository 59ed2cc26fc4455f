//! Lookup verbs: GitLab resources and project path listings.
//!
//! These print what they find and never produce findings, so they exit with
//! status 0 unless the lookup itself fails.

use anyhow::Result;
use clap::Args;

use super::CliConfig;
use super::common::{CommandOutcome, open_operations, print_output};

/// Optional group path argument shared by the lookup verbs.
#[derive(Args, Debug, Clone)]
pub struct GroupArg {
    /// Group path; defaults to the work-dir's base group
    pub group_path: Option<String>,
}

/// Which lookup to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    Group,
    Subgroups,
    Projects,
    LocalProjects,
    RemoteProjects,
}

impl GroupArg {
    pub async fn execute(self, lookup: Lookup, config: &CliConfig) -> Result<CommandOutcome> {
        let ops = open_operations(config).await?;
        let path = self.group_path.as_deref();
        match lookup {
            Lookup::Group => print_output(&ops.group(path).await?, config.format)?,
            Lookup::Subgroups => print_output(&ops.subgroups(path).await?, config.format)?,
            Lookup::Projects => print_output(&ops.projects(path).await?, config.format)?,
            Lookup::LocalProjects => print_output(&ops.local_projects(path)?, config.format)?,
            Lookup::RemoteProjects => {
                print_output(&ops.remote_projects(path).await?, config.format)?;
            }
        }
        Ok(CommandOutcome::Clean)
    }
}

/// Look up one project.
#[derive(Args, Debug, Clone)]
pub struct ProjectCommand {
    /// Full project path, e.g. `team/backend/api`
    pub project_path: String,
}

impl ProjectCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<CommandOutcome> {
        let ops = open_operations(config).await?;
        print_output(&ops.project(&self.project_path).await?, config.format)?;
        Ok(CommandOutcome::Clean)
    }
}
