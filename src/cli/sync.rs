//! `clone`, `fetch` and `pull`.

use anyhow::Result;
use clap::{Args, ValueEnum};

use super::CliConfig;
use super::common::{CommandOutcome, open_operations, print_report};
use crate::bulk::{FastForward, FetchOptions, PullOptions, RecurseSubmodules, TransferOptions};
use crate::constants::DEFAULT_BRANCH;

/// Clone the remote projects that are missing locally.
#[derive(Args, Debug, Clone)]
pub struct CloneCommand {
    /// Group path; defaults to the work-dir's base group
    pub group_path: Option<String>,
}

impl CloneCommand {
    pub async fn execute(self, config: &CliConfig) -> Result<CommandOutcome> {
        let ops = open_operations(config).await?;
        let report = ops.clone_projects(self.group_path.as_deref()).await?;
        print_report(&report, config.format)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RecurseArg {
    Yes,
    No,
    OnDemand,
}

impl From<RecurseArg> for RecurseSubmodules {
    fn from(arg: RecurseArg) -> Self {
        match arg {
            RecurseArg::Yes => Self::Yes,
            RecurseArg::No => Self::No,
            RecurseArg::OnDemand => Self::OnDemand,
        }
    }
}

/// Options controlling what `fetch` and `pull` transfer.
#[derive(Args, Debug, Clone)]
pub struct TransferArgs {
    /// Branch to transfer
    #[arg(short, long, default_value = DEFAULT_BRANCH)]
    pub branch: String,

    /// Also fetch submodules
    #[arg(
        long,
        value_enum,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "yes"
    )]
    pub recurse_submodules: Option<RecurseArg>,

    /// Limit fetching to this many commits
    #[arg(long)]
    pub depth: Option<u32>,

    /// Deepen a shallow history by this many commits
    #[arg(long)]
    pub deepen: Option<u32>,

    /// Deepen a shallow history to commits after this date
    #[arg(long)]
    pub shallow_since: Option<String>,

    /// Convert a shallow repository to a complete one
    #[arg(long)]
    pub unshallow: bool,

    /// Accept refs that update .git/shallow
    #[arg(long)]
    pub update_shallow: bool,
}

impl TransferArgs {
    fn options(&self) -> TransferOptions {
        TransferOptions {
            recurse_submodules: self.recurse_submodules.map(Into::into),
            depth: self.depth,
            deepen: self.deepen,
            shallow_since: self.shallow_since.clone(),
            unshallow: self.unshallow,
            update_shallow: self.update_shallow,
        }
    }
}

/// Fetch one branch in every local repository.
#[derive(Args, Debug, Clone)]
pub struct FetchCommand {
    /// Group path; defaults to the work-dir's base group
    pub group_path: Option<String>,

    #[command(flatten)]
    pub transfer: TransferArgs,

    /// Show what would be done without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Remove remote-tracking refs that no longer exist on the remote
    #[arg(short, long)]
    pub prune: bool,
}

impl FetchCommand {
    fn options(&self) -> FetchOptions {
        FetchOptions {
            branch: self.transfer.branch.clone(),
            transfer: self.transfer.options(),
            dry_run: self.dry_run,
            prune: self.prune,
        }
    }

    pub async fn execute(self, config: &CliConfig) -> Result<CommandOutcome> {
        let ops = open_operations(config).await?;
        let report = ops.fetch(self.group_path.as_deref(), &self.options()).await?;
        print_report(&report, config.format)
    }
}

/// Pull one branch into every local repository that has it checked out.
#[derive(Args, Debug, Clone)]
pub struct PullCommand {
    /// Group path; defaults to the work-dir's base group
    pub group_path: Option<String>,

    #[command(flatten)]
    pub transfer: TransferArgs,

    /// Commit the merge result
    #[arg(long, overrides_with = "no_commit")]
    pub commit: bool,
    #[arg(long, overrides_with = "commit")]
    pub no_commit: bool,

    /// Fast-forward when possible
    #[arg(long, conflicts_with_all = ["no_ff", "ff_only"])]
    pub ff: bool,
    /// Always create a merge commit
    #[arg(long, conflicts_with = "ff_only")]
    pub no_ff: bool,
    /// Refuse anything but a fast-forward
    #[arg(long)]
    pub ff_only: bool,

    /// Squash the merged changes into the working tree
    #[arg(long, overrides_with = "no_squash")]
    pub squash: bool,
    #[arg(long, overrides_with = "squash")]
    pub no_squash: bool,

    /// Rebase instead of merging (`--rebase=merges`, `--rebase=interactive`, ...)
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub rebase: Option<String>,

    /// Merge strategy
    #[arg(short, long)]
    pub strategy: Option<String>,

    /// Allow merging histories without a common ancestor
    #[arg(long)]
    pub allow_unrelated_histories: bool,

    /// Add a Signed-off-by trailer
    #[arg(long, overrides_with = "no_signoff")]
    pub signoff: bool,
    #[arg(long, overrides_with = "signoff")]
    pub no_signoff: bool,

    /// Stash local changes around the pull
    #[arg(long, overrides_with = "no_autostash")]
    pub autostash: bool,
    #[arg(long, overrides_with = "autostash")]
    pub no_autostash: bool,
}

fn toggle(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

impl PullCommand {
    fn options(&self) -> PullOptions {
        let fast_forward = if self.ff_only {
            Some(FastForward::Only)
        } else if self.no_ff {
            Some(FastForward::Never)
        } else if self.ff {
            Some(FastForward::Allow)
        } else {
            None
        };
        PullOptions {
            branch: self.transfer.branch.clone(),
            transfer: self.transfer.options(),
            commit: toggle(self.commit, self.no_commit),
            fast_forward,
            squash: toggle(self.squash, self.no_squash),
            rebase: self.rebase.clone(),
            strategy: self.strategy.clone(),
            allow_unrelated_histories: self.allow_unrelated_histories,
            signoff: toggle(self.signoff, self.no_signoff),
            autostash: toggle(self.autostash, self.no_autostash),
        }
    }

    pub async fn execute(self, config: &CliConfig) -> Result<CommandOutcome> {
        let ops = open_operations(config).await?;
        let report = ops.pull(self.group_path.as_deref(), &self.options()).await?;
        print_report(&report, config.format)
    }
}
