//! Consistency checks and status flags of one local repository.

use anyhow::Result;
use regex::Regex;
use std::sync::LazyLock;

use crate::constants::ORIGIN_REMOTE;
use crate::core::{BulkError, describe_failure};
use crate::git::{GitRepo, Submodule};

/// `<scheme>://<host>` followed by `/<project path>.git`.
static PROJECT_URL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(.*?//[^/]+)/(.*)\.git$").ok());

/// Split a remote URL into server URL and project path.
#[must_use]
pub fn parse_project_url(url: &str) -> Option<(String, String)> {
    let captures = PROJECT_URL.as_ref()?.captures(url)?;
    Some((captures[1].to_string(), captures[2].to_string()))
}

/// Local state flags reported by `status`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepoStatus {
    /// Tracked files are modified
    pub dirty: bool,
    /// Untracked, non-ignored files exist
    pub untracked: bool,
    /// Some branch has commits its upstream does not
    pub need_push: bool,
    /// Some local branch is behind the remote
    pub outdated: bool,
}

/// Checks a repository against the work-dir's expectations.
#[derive(Debug, Clone)]
pub struct RepoInspector {
    server_url: String,
    remote_name: String,
}

impl RepoInspector {
    /// `server_url` is compared against remote URLs; trailing slashes are ignored.
    pub fn new(server_url: &str, remote_name: &str) -> Self {
        Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            remote_name: remote_name.to_string(),
        }
    }

    /// Everything that is wrong with the repository at `group_path`.
    pub async fn inspect(
        &self,
        repo: &GitRepo,
        group_path: &str,
        expected_branch: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut findings = Vec::new();

        let branch = repo.current_branch().await?;
        match (&branch, expected_branch) {
            (None, _) => findings.push("Current HEAD is detached.".to_string()),
            (Some(active), Some(expected)) if active != expected => {
                findings.push(format!("Current branch is '{active}', not '{expected}'."));
            }
            _ => {}
        }

        for submodule in repo.submodules().await? {
            if !repo.is_submodule_initialized(&submodule) {
                continue;
            }
            let sub_repo = repo.submodule_repo(&submodule);
            match sub_repo.current_branch().await? {
                None => findings.push(format!("Submodule '{}' has detached HEAD.", submodule.name)),
                Some(sub_branch) => {
                    let tracked = tracked_branch(&submodule, branch.as_deref());
                    if tracked.is_some_and(|t| t != sub_branch) {
                        findings.push(format!(
                            "Submodule '{}' is not at the branch configured in the superproject.",
                            submodule.name
                        ));
                    }
                }
            }
        }

        let remotes = repo.remote_names().await?;
        let has_remote = |name: &str| remotes.iter().any(|r| r == name);
        if !has_remote(ORIGIN_REMOTE) {
            findings.push(alias_finding(ORIGIN_REMOTE));
        }
        if self.remote_name != ORIGIN_REMOTE && !has_remote(&self.remote_name) {
            findings.push(alias_finding(&self.remote_name));
        }

        if let Some(remote) = repo.remote(&self.remote_name).await? {
            match parse_project_url(&remote.url) {
                None => findings.push(format!("Cannot parse project url '{}'.", remote.url)),
                Some((host, _)) if host.trim_end_matches('/') != self.server_url => {
                    findings.push(format!(
                        "Remote '{}' server url '{}' does not correspond to the current GitLab server url '{}'.",
                        remote.name, host, self.server_url
                    ));
                }
                Some((_, path)) if path != group_path => {
                    findings.push(format!(
                        "Local repo/workdir location does not correspond to its '{}' remote repo location '{}'.",
                        remote.name, path
                    ));
                }
                Some(_) => {}
            }
        }

        Ok(findings)
    }

    /// Status flags; `check_outdated` queries the remote and should only be
    /// set for projects that exist remotely.
    ///
    /// Each flag is checked on its own. A failed check leaves its flag unset
    /// and adds a `"<kind>: <message>"` line to the returned failures.
    pub async fn status(&self, repo: &GitRepo, check_outdated: bool) -> (RepoStatus, Vec<String>) {
        let mut failures = Vec::new();
        let mut settle = |result: Result<bool>| {
            result.unwrap_or_else(|error| {
                tracing::warn!("Status check failed in {}: {error:#}", repo.path().display());
                failures.push(describe_failure(&error));
                false
            })
        };

        let dirty = settle(repo.is_dirty().await);
        let untracked = settle(repo.untracked_files().await.map(|files| !files.is_empty()));
        let need_push = settle(self.need_push(repo).await);
        let outdated = check_outdated && settle(repo.is_outdated(&self.remote_name).await);

        let status = RepoStatus {
            dirty,
            untracked,
            need_push,
            outdated,
        };
        (status, failures)
    }

    /// Whether the current branch, or the tracked branch of an initialized
    /// submodule, is ahead of its upstream.
    async fn need_push(&self, repo: &GitRepo) -> Result<bool> {
        let branch = repo.current_branch().await?;
        if let Some(branch) = &branch {
            if repo.is_ahead_of_upstream(branch).await? {
                return Ok(true);
            }
        }
        for submodule in repo.submodules().await? {
            if !repo.is_submodule_initialized(&submodule) {
                continue;
            }
            let Some(tracked) = tracked_branch(&submodule, branch.as_deref()) else {
                continue;
            };
            if repo.submodule_repo(&submodule).is_ahead_of_upstream(tracked).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// The branch a submodule should be on, if the superproject says so.
///
/// `"."` means "the superproject's branch" and gives no answer while the
/// superproject is detached.
fn tracked_branch<'a>(submodule: &'a Submodule, super_branch: Option<&'a str>) -> Option<&'a str> {
    match submodule.branch.as_deref() {
        None => None,
        Some(".") => super_branch,
        Some(branch) => Some(branch),
    }
}

fn alias_finding(alias: &str) -> String {
    BulkError::RemoteAliasError {
        alias: alias.to_string(),
    }
    .to_string()
}
