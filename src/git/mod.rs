//! Git operations wrapper for glbulk
//!
//! glbulk drives the system `git` executable (like Cargo does) instead of
//! linking a git library. Every call is asynchronous and goes through
//! [`command_builder::GitCommand`], which owns timeouts, logging and error
//! mapping.
//!
//! [`GitRepo`] is a handle on one working tree. It answers the questions the
//! repository inspector asks (active branch, remotes, submodules, dirty state,
//! upstream tracking) and performs the batch network operations (clone,
//! fetch, pull).

pub mod command_builder;
pub mod fetch_info;
#[cfg(test)]
mod tests;

use crate::constants::GIT_METADATA_DIR;
use crate::git::command_builder::GitCommand;
pub use crate::git::fetch_info::{FetchFlag, FetchInfo};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// A named remote and its fetch URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    /// Alias, e.g. `origin`
    pub name: String,
    /// Fetch URL
    pub url: String,
}

/// A submodule declared in `.gitmodules`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submodule {
    /// Name of the `[submodule "<name>"]` section
    pub name: String,
    /// Path relative to the superproject root
    pub path: String,
    /// Declared `branch` setting; `"."` means "same as the superproject"
    pub branch: Option<String>,
}

/// Handle on a local git working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitRepo {
    path: PathBuf,
}

impl GitRepo {
    /// Creates a handle; nothing is checked until a command runs.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Whether `dir` contains git metadata (a `.git` directory or file).
    #[must_use]
    pub fn is_repository_root(dir: &Path) -> bool {
        dir.join(GIT_METADATA_DIR).exists()
    }

    /// The working tree root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Clone `url` into `target`. Missing parent directories are created by git.
    pub async fn clone(url: &str, target: impl AsRef<Path>) -> Result<Self> {
        let target_path = target.as_ref();
        GitCommand::clone(url, target_path).execute().await?;
        Ok(Self::new(target_path))
    }

    /// The checked-out branch, or `None` when HEAD is detached.
    pub async fn current_branch(&self) -> Result<Option<String>> {
        let branch = GitCommand::current_branch()
            .current_dir(&self.path)
            .execute_stdout()
            .await
            .with_context(|| format!("Failed to read HEAD of {}", self.path.display()))?;
        Ok((!branch.is_empty()).then_some(branch))
    }

    /// Names of all configured remotes.
    pub async fn remote_names(&self) -> Result<Vec<String>> {
        let stdout = GitCommand::list_remotes().current_dir(&self.path).execute_stdout().await?;
        Ok(stdout.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect())
    }

    /// Look a remote up by alias; `None` when it is not configured.
    pub async fn remote(&self, name: &str) -> Result<Option<Remote>> {
        if !self.remote_names().await?.iter().any(|n| n == name) {
            return Ok(None);
        }
        let url = GitCommand::remote_url(name).current_dir(&self.path).execute_stdout().await?;
        Ok(Some(Remote {
            name: name.to_string(),
            url,
        }))
    }

    /// Submodules declared in `.gitmodules`, in declaration order.
    pub async fn submodules(&self) -> Result<Vec<Submodule>> {
        if !self.path.join(".gitmodules").is_file() {
            return Ok(Vec::new());
        }
        let output = match GitCommand::submodule_config().current_dir(&self.path).execute().await
        {
            Ok(output) => output.stdout,
            // `--get-regexp` exits 1 when nothing matches
            Err(e) if is_git_command_error(&e) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };
        Ok(parse_submodule_config(&output))
    }

    /// Whether a declared submodule has been checked out.
    #[must_use]
    pub fn is_submodule_initialized(&self, submodule: &Submodule) -> bool {
        Self::is_repository_root(&self.path.join(&submodule.path))
    }

    /// Handle on a submodule's working tree.
    #[must_use]
    pub fn submodule_repo(&self, submodule: &Submodule) -> Self {
        Self::new(self.path.join(&submodule.path))
    }

    /// Tracked changes in index or working tree (untracked files excluded).
    pub async fn is_dirty(&self) -> Result<bool> {
        let stdout = GitCommand::status_tracked().current_dir(&self.path).execute_stdout().await?;
        Ok(!stdout.is_empty())
    }

    /// Untracked, not ignored files relative to the root.
    pub async fn untracked_files(&self) -> Result<Vec<String>> {
        let stdout = GitCommand::untracked_files().current_dir(&self.path).execute_stdout().await?;
        Ok(stdout.lines().filter(|l| !l.is_empty()).map(String::from).collect())
    }

    /// Whether `branch` has commits its upstream does not.
    ///
    /// A branch without upstream is never ahead.
    pub async fn is_ahead_of_upstream(&self, branch: &str) -> Result<bool> {
        let track =
            GitCommand::upstream_track(branch).current_dir(&self.path).execute_stdout().await?;
        Ok(track.contains('>'))
    }

    /// Local branch heads as `name -> sha`.
    pub async fn local_heads(&self) -> Result<HashMap<String, String>> {
        let stdout = GitCommand::local_heads().current_dir(&self.path).execute_stdout().await?;
        Ok(stdout
            .lines()
            .filter_map(|line| line.split_once(' '))
            .map(|(name, sha)| (name.to_string(), sha.trim().to_string()))
            .collect())
    }

    /// Branch heads on `remote` as `name -> sha` (network call).
    pub async fn remote_heads(&self, remote: &str) -> Result<HashMap<String, String>> {
        let stdout =
            GitCommand::ls_remote_heads(remote).current_dir(&self.path).execute_stdout().await?;
        Ok(stdout
            .lines()
            .filter_map(|line| line.split_once('\t'))
            .filter_map(|(sha, name)| {
                name.strip_prefix("refs/heads/").map(|n| (n.to_string(), sha.to_string()))
            })
            .collect())
    }

    /// Whether `ancestor` is reachable from `descendant`.
    ///
    /// Unknown objects answer `false`.
    pub async fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool> {
        GitCommand::is_ancestor(ancestor, descendant).current_dir(&self.path).execute_check().await
    }

    /// Whether any local branch is behind its namesake on `remote`.
    ///
    /// A local branch is out of date when the remote head differs and is not
    /// already contained in the local head. This matches what
    /// `git remote show <remote>` reports as "local out of date".
    pub async fn is_outdated(&self, remote: &str) -> Result<bool> {
        let local = self.local_heads().await?;
        if local.is_empty() {
            return Ok(false);
        }
        let remote_heads = self.remote_heads(remote).await?;
        for (branch, local_sha) in &local {
            let Some(remote_sha) = remote_heads.get(branch) else {
                continue;
            };
            if remote_sha == local_sha {
                continue;
            }
            if !self.is_ancestor(remote_sha, local_sha).await? {
                tracing::debug!(
                    "{}: branch '{}' is behind {}/{}",
                    self.path.display(),
                    branch,
                    remote,
                    branch
                );
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// `git fetch` one refspec; returns the first ref outcome, if any.
    pub async fn fetch(
        &self,
        remote: &str,
        refspec: &str,
        options: &[String],
        context: &str,
    ) -> Result<Option<FetchInfo>> {
        let output = GitCommand::fetch(remote, refspec, options)
            .current_dir(&self.path)
            .with_context(context)
            .execute()
            .await?;
        Ok(first_ref_outcome(&output.stderr, &output.stdout))
    }

    /// `git pull` one refspec; returns the first fetched ref outcome, if any.
    pub async fn pull(
        &self,
        remote: &str,
        refspec: &str,
        options: &[String],
        context: &str,
    ) -> Result<Option<FetchInfo>> {
        let output = GitCommand::pull(remote, refspec, options)
            .current_dir(&self.path)
            .with_context(context)
            .execute()
            .await?;
        Ok(first_ref_outcome(&output.stderr, &output.stdout))
    }
}

fn first_ref_outcome(stderr: &str, stdout: &str) -> Option<FetchInfo> {
    FetchInfo::parse_all(stderr)
        .into_iter()
        .next()
        .or_else(|| FetchInfo::parse_all(stdout).into_iter().next())
}

fn is_git_command_error(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<crate::core::BulkError>(),
        Some(crate::core::BulkError::GitCommandError {
            ..
        })
    )
}

/// Parse `git config --get-regexp ^submodule\.` output.
///
/// Lines look like `submodule.<name>.<key> <value>`; the name may itself
/// contain dots, so the key is split off from the right.
fn parse_submodule_config(output: &str) -> Vec<Submodule> {
    let mut order: Vec<String> = Vec::new();
    let mut paths: HashMap<String, String> = HashMap::new();
    let mut branches: HashMap<String, String> = HashMap::new();

    for line in output.lines() {
        let Some((key, value)) = line.split_once(' ') else {
            continue;
        };
        let Some(rest) = key.strip_prefix("submodule.") else {
            continue;
        };
        let Some((name, setting)) = rest.rsplit_once('.') else {
            continue;
        };
        if !order.iter().any(|n| n == name) {
            order.push(name.to_string());
        }
        match setting {
            "path" => {
                paths.insert(name.to_string(), value.trim().to_string());
            }
            "branch" => {
                branches.insert(name.to_string(), value.trim().to_string());
            }
            _ => {}
        }
    }

    order
        .into_iter()
        .filter_map(|name| {
            let path = paths.remove(&name)?;
            let branch = branches.remove(&name);
            Some(Submodule {
                name,
                path,
                branch,
            })
        })
        .collect()
}
