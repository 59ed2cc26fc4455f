//! The `clone`, `fetch` and `pull` verbs.
//!
//! `fetch` and `pull` transfer one branch through the refspec
//! `<branch>:remotes/<remote>/<branch>` so git reports the outcome of that
//! ref. A repository is listed only when the ref changed; its values are
//! the outcome flags (`FAST_FORWARD`, `REJECTED`, ...).

use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;

use super::runner::outcomes_to_report;
use super::{AliasPolicy, BulkOperations, Report, RepoTask};
use crate::constants::DEFAULT_BRANCH;
use crate::git::GitRepo;

/// Value of `--recurse-submodules`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecurseSubmodules {
    Yes,
    No,
    OnDemand,
}

/// Options shared by fetch and pull that control what is transferred.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferOptions {
    pub recurse_submodules: Option<RecurseSubmodules>,
    pub depth: Option<u32>,
    pub deepen: Option<u32>,
    pub shallow_since: Option<String>,
    pub unshallow: bool,
    pub update_shallow: bool,
}

impl TransferOptions {
    fn push_args(&self, args: &mut Vec<String>) {
        match self.recurse_submodules {
            Some(RecurseSubmodules::Yes) => args.push("--recurse-submodules".to_string()),
            Some(RecurseSubmodules::No) => args.push("--no-recurse-submodules".to_string()),
            Some(RecurseSubmodules::OnDemand) => {
                args.push("--recurse-submodules=on-demand".to_string());
            }
            None => {}
        }
        if let Some(depth) = self.depth {
            args.push(format!("--depth={depth}"));
        }
        if let Some(deepen) = self.deepen {
            args.push(format!("--deepen={deepen}"));
        }
        if let Some(since) = &self.shallow_since {
            args.push(format!("--shallow-since={since}"));
        }
        if self.unshallow {
            args.push("--unshallow".to_string());
        }
        if self.update_shallow {
            args.push("--update-shallow".to_string());
        }
    }
}

/// Options of the `fetch` verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    pub branch: String,
    pub transfer: TransferOptions,
    pub dry_run: bool,
    pub prune: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            transfer: TransferOptions::default(),
            dry_run: false,
            prune: false,
        }
    }
}

impl FetchOptions {
    /// Command line flags for `git fetch`.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        self.transfer.push_args(&mut args);
        if self.dry_run {
            args.push("--dry-run".to_string());
        }
        if self.prune {
            args.push("--prune".to_string());
        }
        args
    }
}

/// Value of `--ff` / `--no-ff` / `--ff-only`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FastForward {
    Allow,
    Never,
    Only,
}

/// Options of the `pull` verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullOptions {
    pub branch: String,
    pub transfer: TransferOptions,
    /// `Some(false)` gives `--no-commit`
    pub commit: Option<bool>,
    pub fast_forward: Option<FastForward>,
    pub squash: Option<bool>,
    /// `Some("")` gives a bare `--rebase`
    pub rebase: Option<String>,
    pub strategy: Option<String>,
    pub allow_unrelated_histories: bool,
    pub signoff: Option<bool>,
    pub autostash: Option<bool>,
}

impl Default for PullOptions {
    fn default() -> Self {
        Self {
            branch: DEFAULT_BRANCH.to_string(),
            transfer: TransferOptions::default(),
            commit: None,
            fast_forward: None,
            squash: None,
            rebase: None,
            strategy: None,
            allow_unrelated_histories: false,
            signoff: None,
            autostash: None,
        }
    }
}

fn toggle(args: &mut Vec<String>, name: &str, value: Option<bool>) {
    match value {
        Some(true) => args.push(format!("--{name}")),
        Some(false) => args.push(format!("--no-{name}")),
        None => {}
    }
}

impl PullOptions {
    /// Command line flags for `git pull`.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        self.transfer.push_args(&mut args);
        toggle(&mut args, "commit", self.commit);
        match self.fast_forward {
            Some(FastForward::Allow) => args.push("--ff".to_string()),
            Some(FastForward::Never) => args.push("--no-ff".to_string()),
            Some(FastForward::Only) => args.push("--ff-only".to_string()),
            None => {}
        }
        toggle(&mut args, "squash", self.squash);
        match self.rebase.as_deref() {
            Some("") => args.push("--rebase".to_string()),
            Some(mode) => args.push(format!("--rebase={mode}")),
            None => {}
        }
        if let Some(strategy) = &self.strategy {
            args.push(format!("--strategy={strategy}"));
        }
        if self.allow_unrelated_histories {
            args.push("--allow-unrelated-histories".to_string());
        }
        toggle(&mut args, "signoff", self.signoff);
        toggle(&mut args, "autostash", self.autostash);
        args
    }
}

fn refspec(branch: &str, remote: &str) -> String {
    format!("{branch}:remotes/{remote}/{branch}")
}

impl BulkOperations {
    /// Fetch `options.branch` in every local repository.
    pub async fn fetch(&self, group_path: Option<&str>, options: &FetchOptions) -> Result<Report> {
        let entries = self.workdir().project_set(Some(&self.group_or_base(group_path)))?;
        let branch = options.branch.clone();
        let args = options.to_args();

        let op = Arc::new(move |task: RepoTask| {
            let branch = branch.clone();
            let args = args.clone();
            async move {
                let Some(remote) = task.remote else {
                    return Ok(Vec::new());
                };
                let info = task
                    .repo
                    .fetch(&remote.name, &refspec(&branch, &remote.name), &args, &task.group_path)
                    .await?;
                Ok::<_, anyhow::Error>(info.map(|i| i.reportable_flags()).unwrap_or_default())
            }
        });
        let outcomes = self
            .runner()
            .run_repos(entries, self.workdir().remote_name(), AliasPolicy::Required, op)
            .await;
        Ok(outcomes_to_report(outcomes, |flags| flags))
    }

    /// Pull `options.branch` into every local repository that has it checked out.
    pub async fn pull(&self, group_path: Option<&str>, options: &PullOptions) -> Result<Report> {
        let entries = self.workdir().project_set(Some(&self.group_or_base(group_path)))?;
        let branch = options.branch.clone();
        let args = options.to_args();

        let op = Arc::new(move |task: RepoTask| {
            let branch = branch.clone();
            let args = args.clone();
            async move {
                let Some(remote) = task.remote else {
                    return Ok(Vec::new());
                };
                if task.repo.current_branch().await?.as_deref() != Some(branch.as_str()) {
                    return Ok(vec![format!("Current branch is not '{branch}'")]);
                }
                let info = task
                    .repo
                    .pull(&remote.name, &refspec(&branch, &remote.name), &args, &task.group_path)
                    .await?;
                Ok::<_, anyhow::Error>(info.map(|i| i.reportable_flags()).unwrap_or_default())
            }
        });
        let outcomes = self
            .runner()
            .run_repos(entries, self.workdir().remote_name(), AliasPolicy::Required, op)
            .await;
        Ok(outcomes_to_report(outcomes, |lines| lines))
    }

    /// Clone every remote project below `group_path` that is missing locally.
    pub async fn clone_projects(&self, group_path: Option<&str>) -> Result<Report> {
        let group = self.group_or_base(group_path);
        let server_url = self.workdir().server()?.normalized_url().to_string();

        let items = self
            .catalog()
            .project_paths(&group)
            .await?
            .into_iter()
            .map(|path| {
                let local = self.workdir().to_local_path(&path)?;
                let url = format!("{server_url}/{path}.git");
                Ok((path, (local, url)))
            })
            .collect::<Result<Vec<(String, (PathBuf, String))>>>()?;

        let results = self
            .runner()
            .run_isolated(items, |(local, url): (PathBuf, String)| async move {
                if GitRepo::is_repository_root(&local) {
                    return Ok(vec!["Project already exists.".to_string()]);
                }
                tracing::info!("Cloning {} into {}", url, local.display());
                GitRepo::clone(&url, &local).await?;
                Ok::<_, anyhow::Error>(Vec::new())
            })
            .await;

        let mut report = Report::new();
        for (path, result) in results {
            match result {
                Ok(lines) => report.insert(path, lines),
                Err(finding) => report.push(path, finding),
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::BatchRunner;
    use crate::config::{ServerConfig, WorkdirConfig};
    use crate::test_utils::{MockGitLab, TestGit};
    use crate::workdir::WorkdirContext;
    use std::path::Path;
    use tempfile::TempDir;

    const SERVER: &str = "https://gitlab.example.com";

    fn operations(root: &Path, server: &str, api: MockGitLab) -> BulkOperations {
        crate::test_utils::init_test_logging(None);
        let config = WorkdirConfig::new("team", "origin", ServerConfig::new(server));
        BulkOperations::new(WorkdirContext::new(root, config), Arc::new(api), BatchRunner::new(2))
    }

    /// A served `team/app` with a work-dir clone one commit behind it.
    fn behind_server(temp: &Path) -> TestGit {
        let served = temp.join("served");
        let bare = TestGit::new(served.join("team").join("app.git"));
        bare.init_bare().unwrap();

        let app = TestGit::new(temp.join("work").join("app"));
        app.init().unwrap();
        app.commit_file("README.md", "# app\n", "Initial commit").unwrap();
        app.remote_add("origin", &format!("{SERVER}/team/app.git")).unwrap();
        app.redirect_url(SERVER, &served).unwrap();
        app.push_upstream("origin", "master").unwrap();

        let other = TestGit::new(temp.join("other"));
        other.init().unwrap();
        other.remote_add("origin", &bare.repo_path().display().to_string()).unwrap();
        other.fetch("origin").unwrap();
        other.reset_hard("origin/master").unwrap();
        other.commit_file("CHANGELOG.md", "- more\n", "Second commit").unwrap();
        other.push_upstream("origin", "master").unwrap();
        app
    }

    #[test]
    fn test_fetch_args() {
        let options = FetchOptions {
            transfer: TransferOptions {
                recurse_submodules: Some(RecurseSubmodules::OnDemand),
                depth: Some(3),
                unshallow: true,
                ..TransferOptions::default()
            },
            prune: true,
            ..FetchOptions::default()
        };
        assert_eq!(options.branch, "master");
        assert_eq!(
            options.to_args(),
            vec!["--recurse-submodules=on-demand", "--depth=3", "--unshallow", "--prune"]
        );
    }

    #[test]
    fn test_pull_args() {
        let options = PullOptions {
            commit: Some(false),
            fast_forward: Some(FastForward::Only),
            rebase: Some(String::new()),
            strategy: Some("ours".to_string()),
            autostash: Some(true),
            ..PullOptions::default()
        };
        assert_eq!(
            options.to_args(),
            vec!["--no-commit", "--ff-only", "--rebase", "--strategy=ours", "--autostash"]
        );

        let interactive = PullOptions {
            rebase: Some("merges".to_string()),
            signoff: Some(false),
            ..PullOptions::default()
        };
        assert_eq!(interactive.to_args(), vec!["--rebase=merges", "--no-signoff"]);
    }

    #[test]
    fn test_refspec() {
        assert_eq!(refspec("master", "origin"), "master:remotes/origin/master");
    }

    #[tokio::test]
    async fn test_fetch_reports_changed_refs_only() {
        let temp = TempDir::new().unwrap();
        behind_server(temp.path());
        let lonely = TestGit::new(temp.path().join("work").join("lonely"));
        lonely.init().unwrap();
        lonely.commit_file("README.md", "# lonely\n", "Initial commit").unwrap();

        let ops = operations(&temp.path().join("work"), SERVER, MockGitLab::new());
        let report = ops.fetch(None, &FetchOptions::default()).await.unwrap();
        assert_eq!(report.get("team/app").unwrap(), ["FAST_FORWARD"]);
        assert_eq!(report.get("team/lonely").unwrap(), ["Remote alias 'origin' is not set."]);

        let again = ops.fetch(Some("team/app"), &FetchOptions::default()).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn test_pull_updates_matching_branch() {
        let temp = TempDir::new().unwrap();
        let app = behind_server(temp.path());

        let ops = operations(&temp.path().join("work"), SERVER, MockGitLab::new());
        let report = ops.pull(None, &PullOptions::default()).await.unwrap();
        assert_eq!(report.get("team/app").unwrap(), ["FAST_FORWARD"]);
        assert!(app.repo_path().join("CHANGELOG.md").exists());

        app.create_branch("feature").unwrap();
        let report = ops.pull(None, &PullOptions::default()).await.unwrap();
        assert_eq!(report.get("team/app").unwrap(), ["Current branch is not 'master'"]);
    }

    #[tokio::test]
    async fn test_clone_missing_projects() {
        let temp = TempDir::new().unwrap();
        let served = temp.path().join("served");
        TestGit::new(served.join("team").join("fresh.git")).init_bare().unwrap();
        let existing = TestGit::new(temp.path().join("work").join("existing"));
        existing.init().unwrap();

        let api = MockGitLab::new()
            .with_project(1, "team/existing")
            .with_project(2, "team/fresh")
            .with_project(3, "team/gone")
            .with_project(4, "elsewhere/other");
        let server = served.display().to_string();
        let ops = operations(&temp.path().join("work"), &server, api);

        let report = ops.clone_projects(None).await.unwrap();
        assert_eq!(report.get("team/existing").unwrap(), ["Project already exists."]);
        assert!(!report.contains_key("team/fresh"));
        assert!(temp.path().join("work").join("fresh").join(".git").exists());
        let gone = report.get("team/gone").unwrap();
        assert_eq!(gone.len(), 1);
        assert!(gone[0].starts_with("GitCloneFailed: "), "{}", gone[0]);
        assert!(!report.contains_key("elsewhere/other"));
    }
}
