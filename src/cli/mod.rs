//! Command-line interface for glbulk.
//!
//! Every subcommand is a variant of [`Commands`] carrying its own clap
//! argument struct. Commands run inside a work-dir (found by walking up from
//! the current directory), except `init`, which creates one.
//!
//! # Commands
//!
//! | Command | Output | Exit status 1 when |
//! |---------|--------|--------------------|
//! | `group`, `project`, `subgroups`, `projects` | GitLab resources | lookup fails |
//! | `local-projects`, `remote-projects` | group paths | lookup fails |
//! | `errors`, `status` | findings report | report is non-empty |
//! | `ci-status` | CI label report | a pipeline failed |
//! | `clone`, `fetch`, `pull` | per-project report | report is non-empty |
//! | `init` | confirmation | the work-dir cannot be created |
//!
//! # Global Options
//!
//! - `--verbose` / `--quiet` - log level (`debug` / `error`; otherwise `RUST_LOG` or `warn`)
//! - `--config` - global configuration file used by `init`
//! - `--format` - `text`, `json` or `yaml`
//! - `--max-parallel` - repositories processed at once
//!
//! ```bash
//! glbulk init team team-wd
//! cd team-wd && glbulk clone
//! glbulk --format json status --ci
//! glbulk --max-parallel 8 pull backend --ff-only
//! ```

pub mod common;
mod init;
mod inspect;
mod query;
mod sync;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub use common::{CommandOutcome, OutputFormat};

/// Settings derived from the global options, passed to every command.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter override; `None` defers to `RUST_LOG`
    pub log_level: Option<String>,

    /// Global configuration file override, `~/` and `$VAR` not yet expanded
    pub config_path: Option<String>,

    pub format: OutputFormat,

    pub max_parallel: Option<usize>,
}

impl CliConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether only errors should be printed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.log_level.as_deref() == Some("error")
    }

    /// Install the stderr log subscriber. Later calls are no-ops.
    pub fn init_logging(&self) {
        let filter = match &self.log_level {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Bulk operations over a GitLab group hierarchy mirrored into a local work-dir.
#[derive(Parser)]
#[command(
    name = "glbulk",
    about = "Bulk operations over a GitLab group and its local work-dir",
    version,
    long_about = "glbulk mirrors a GitLab group hierarchy into a local directory tree and runs \
                  status checks, clones, fetches and pulls over every project in it."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the global configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Maximum number of repositories processed concurrently
    #[arg(long, global = true, env = "GLBULK_MAX_PARALLEL")]
    max_parallel: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show a group (default: the work-dir's base group)
    Group(query::GroupArg),

    /// Show a project
    Project(query::ProjectCommand),

    /// List the direct subgroups of a group
    Subgroups(query::GroupArg),

    /// List the direct projects of a group
    Projects(query::GroupArg),

    /// List the local repositories below a group
    LocalProjects(query::GroupArg),

    /// List the remote projects below a group
    RemoteProjects(query::GroupArg),

    /// Report consistency problems of the local repositories
    Errors(inspect::ErrorsCommand),

    /// Summarize the work-dir against the server
    Status(inspect::StatusCommand),

    /// Classify the latest CI pipelines
    CiStatus(inspect::CiStatusCommand),

    /// Clone missing projects
    Clone(sync::CloneCommand),

    /// Fetch a branch in every local repository
    Fetch(sync::FetchCommand),

    /// Pull a branch into every local repository
    Pull(sync::PullCommand),

    /// Create a work-dir for a group
    Init(init::InitCommand),
}

impl Cli {
    /// Run the parsed command with logging configured from the global options.
    pub async fn execute(self) -> Result<CommandOutcome> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            Some("debug".to_string())
        } else if self.quiet {
            Some("error".to_string())
        } else {
            None
        };

        CliConfig {
            log_level,
            config_path: self.config.clone(),
            format: self.format,
            max_parallel: self.max_parallel,
        }
    }

    pub async fn execute_with_config(self, config: CliConfig) -> Result<CommandOutcome> {
        use query::Lookup;

        match self.command {
            Commands::Group(cmd) => cmd.execute(Lookup::Group, &config).await,
            Commands::Project(cmd) => cmd.execute(&config).await,
            Commands::Subgroups(cmd) => cmd.execute(Lookup::Subgroups, &config).await,
            Commands::Projects(cmd) => cmd.execute(Lookup::Projects, &config).await,
            Commands::LocalProjects(cmd) => cmd.execute(Lookup::LocalProjects, &config).await,
            Commands::RemoteProjects(cmd) => cmd.execute(Lookup::RemoteProjects, &config).await,
            Commands::Errors(cmd) => cmd.execute(&config).await,
            Commands::Status(cmd) => cmd.execute(&config).await,
            Commands::CiStatus(cmd) => cmd.execute(&config).await,
            Commands::Clone(cmd) => cmd.execute(&config).await,
            Commands::Fetch(cmd) => cmd.execute(&config).await,
            Commands::Pull(cmd) => cmd.execute(&config).await,
            Commands::Init(cmd) => cmd.execute(&config).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_build_config() {
        let cli = Cli::parse_from(["glbulk", "--quiet", "--format", "yaml", "status", "--no-remote"]);
        let config = cli.build_config();
        assert!(config.is_quiet());
        assert_eq!(config.format, OutputFormat::Yaml);

        let cli = Cli::parse_from(["glbulk", "fetch", "team", "--max-parallel", "4", "-v"]);
        let config = cli.build_config();
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.max_parallel, Some(4));
    }

    #[test]
    fn test_status_ci_conflicts_with_no_remote() {
        assert!(Cli::try_parse_from(["glbulk", "status", "--ci", "--no-remote"]).is_err());
    }
}
