//! Type-safe Git command builder for consistent command execution
//!
//! Every git invocation in glbulk goes through [`GitCommand`] so that working
//! directory handling, timeouts, logging and error mapping are identical for
//! local queries and network operations alike.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

use crate::constants::{GIT_CLONE_TIMEOUT, GIT_FETCH_TIMEOUT, GIT_QUERY_TIMEOUT};
use crate::core::BulkError;
use crate::utils::platform::get_git_command;

/// Fluent builder for a single git process.
///
/// ```rust,no_run
/// use glbulk_cli::git::command_builder::GitCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let branch = GitCommand::current_branch()
///     .current_dir("/work/team/service")
///     .execute_stdout()
///     .await?;
/// # Ok(())
/// # }
/// ```
///
/// Defaults: output captured, five minute timeout, inherited environment.
/// The `-C <dir>` flag is used instead of changing the process directory so
/// concurrent commands never interfere.
pub struct GitCommand {
    /// Command arguments passed to git
    args: Vec<String>,

    /// Directory passed through `-C`
    current_dir: Option<PathBuf>,

    /// Extra environment variables for the git process
    env_vars: Vec<(String, String)>,

    /// Maximum duration to wait for completion (None = no timeout)
    timeout_duration: Option<Duration>,

    /// Identifier included in log lines (typically the group path)
    context: Option<String>,

    /// For clone commands, the URL for error messages
    clone_url: Option<String>,
}

impl Default for GitCommand {
    fn default() -> Self {
        Self {
            args: Vec::new(),
            current_dir: None,
            env_vars: Vec::new(),
            timeout_duration: Some(Duration::from_secs(300)),
            context: None,
            clone_url: None,
        }
    }
}

impl GitCommand {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run git inside `dir` (passed as `-C dir`).
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Adds a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Adds multiple arguments in order.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds an environment variable for this invocation only.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.push((key.into(), value.into()));
        self
    }

    /// Force untranslated git messages so output parsing is stable.
    pub fn untranslated(self) -> Self {
        self.env("LC_ALL", "C")
    }

    /// Never block on credential prompts.
    pub fn non_interactive(self) -> Self {
        self.env("GIT_TERMINAL_PROMPT", "0")
    }

    /// Set a custom timeout for the command (None for no timeout)
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Set a context for logging (e.g. the group path being processed).
    ///
    /// With a context, log lines read
    /// `(team/service) Executing command: git -C /work/team/service fetch ...`,
    /// which keeps concurrent batch output readable.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    fn full_args(&self) -> Vec<String> {
        let mut full_args = Vec::with_capacity(self.args.len() + 2);
        if let Some(ref dir) = self.current_dir {
            full_args.push("-C".to_string());
            full_args.push(dir.display().to_string());
        }
        full_args.extend(self.args.iter().cloned());
        full_args
    }

    fn operation(&self) -> String {
        self.args.first().cloned().unwrap_or_else(|| "unknown".to_string())
    }

    fn prefix(&self) -> String {
        self.context.as_ref().map(|ctx| format!("({ctx}) ")).unwrap_or_default()
    }

    /// Execute the command and return its captured output.
    ///
    /// A non-zero exit status becomes [`BulkError::GitCommandError`]
    /// (or [`BulkError::GitCloneFailed`] for clones) carrying stderr.
    pub async fn execute(self) -> Result<GitCommandOutput> {
        let start = std::time::Instant::now();
        let git_command = get_git_command();
        let full_args = self.full_args();
        let prefix = self.prefix();

        tracing::debug!(
            target: "git",
            "{}Executing command: {} {}",
            prefix,
            git_command,
            full_args.join(" ")
        );

        let mut cmd = Command::new(git_command);
        cmd.args(&full_args);
        for (key, value) in &self.env_vars {
            tracing::trace!(target: "git", "Setting env var: {}={}", key, value);
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        let output_future = cmd.output();
        let spawned = if let Some(duration) = self.timeout_duration {
            if let Ok(result) = timeout(duration, output_future).await {
                result
            } else {
                tracing::warn!(
                    target: "git",
                    "{}Command timed out after {} seconds: git {}",
                    prefix,
                    duration.as_secs(),
                    full_args.join(" ")
                );
                return Err(BulkError::GitCommandError {
                    operation: self.operation(),
                    stderr: format!(
                        "Git command timed out after {} seconds: git {}",
                        duration.as_secs(),
                        full_args.join(" ")
                    ),
                }
                .into());
            }
        } else {
            output_future.await
        };

        let output = match spawned {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(BulkError::GitNotFound.into());
            }
            Err(e) => {
                return Err(e).context(format!("Failed to execute git {}", full_args.join(" ")));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            tracing::debug!(
                target: "git",
                "{}Command failed with exit code {:?}: {}",
                prefix,
                output.status.code(),
                stderr.trim()
            );

            let error = if let Some(url) = self.clone_url {
                BulkError::GitCloneFailed {
                    url,
                    reason: stderr,
                }
            } else {
                BulkError::GitCommandError {
                    operation: self.args.first().cloned().unwrap_or_else(|| "unknown".to_string()),
                    stderr: if stderr.trim().is_empty() {
                        stdout
                    } else {
                        stderr
                    },
                }
            };
            return Err(error.into());
        }

        if !stdout.is_empty() {
            tracing::debug!(target: "git", "{}{}", prefix, stdout.trim());
        }
        if !stderr.is_empty() {
            tracing::debug!(target: "git", "{}{}", prefix, stderr.trim());
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::info!(
                target: "git::perf",
                "{}Git {} took {:.2}s",
                prefix,
                self.operation(),
                elapsed.as_secs_f64()
            );
        } else if elapsed.as_millis() > 100 {
            tracing::debug!(
                target: "git::perf",
                "{}Git {} took {}ms",
                prefix,
                self.operation(),
                elapsed.as_millis()
            );
        }

        Ok(GitCommandOutput {
            stdout,
            stderr,
        })
    }

    /// Execute the command and return only stdout as a trimmed string
    pub async fn execute_stdout(self) -> Result<String> {
        let output = self.execute().await?;
        Ok(output.stdout.trim().to_string())
    }

    /// Execute the command and report whether it exited successfully.
    ///
    /// For predicates such as `merge-base --is-ancestor` where a non-zero
    /// exit is an answer rather than a failure. A missing git executable is
    /// still an error.
    pub async fn execute_check(self) -> Result<bool> {
        match self.execute().await {
            Ok(_) => Ok(true),
            Err(e) => match e.downcast_ref::<BulkError>() {
                Some(BulkError::GitCommandError {
                    ..
                }) => Ok(false),
                _ => Err(e),
            },
        }
    }
}

/// Output from a Git command
#[derive(Debug)]
pub struct GitCommandOutput {
    /// Standard output from the Git command
    pub stdout: String,
    /// Standard error output from the Git command
    pub stderr: String,
}

// Convenience builders for the operations glbulk needs

impl GitCommand {
    /// `git clone <url> <target>`
    pub fn clone(url: &str, target: impl AsRef<Path>) -> Self {
        let mut cmd = Self::new()
            .args(["clone", url])
            .arg(target.as_ref().display().to_string())
            .non_interactive()
            .with_timeout(Some(GIT_CLONE_TIMEOUT));
        cmd.clone_url = Some(url.to_string());
        cmd
    }

    /// `git fetch -v <options> <remote> <refspec>`
    ///
    /// `-v` makes git list every ref it considered, including unchanged
    /// ones, which is what the per-ref outcome parser reads.
    pub fn fetch(remote: &str, refspec: &str, options: &[String]) -> Self {
        Self::new()
            .args(["fetch", "-v"])
            .args(options.iter().cloned())
            .args([remote, refspec])
            .untranslated()
            .non_interactive()
            .with_timeout(Some(GIT_FETCH_TIMEOUT))
    }

    /// `git pull -v <options> <remote> <refspec>`
    pub fn pull(remote: &str, refspec: &str, options: &[String]) -> Self {
        Self::new()
            .args(["pull", "-v"])
            .args(options.iter().cloned())
            .args([remote, refspec])
            .untranslated()
            .non_interactive()
            .with_timeout(Some(GIT_FETCH_TIMEOUT))
    }

    /// Current branch name; empty output when HEAD is detached.
    pub fn current_branch() -> Self {
        Self::new().args(["branch", "--show-current"]).with_timeout(Some(GIT_QUERY_TIMEOUT))
    }

    /// Names of all configured remotes, one per line.
    pub fn list_remotes() -> Self {
        Self::new().arg("remote").with_timeout(Some(GIT_QUERY_TIMEOUT))
    }

    /// Configured URL of a remote, before any `url.<base>.insteadOf` rewrite.
    pub fn remote_url(name: &str) -> Self {
        Self::new()
            .args(["config", "--get"])
            .arg(format!("remote.{name}.url"))
            .with_timeout(Some(GIT_QUERY_TIMEOUT))
    }

    /// Submodule declarations from `.gitmodules`.
    pub fn submodule_config() -> Self {
        Self::new()
            .args(["config", "--file", ".gitmodules", "--get-regexp", r"^submodule\."])
            .with_timeout(Some(GIT_QUERY_TIMEOUT))
    }

    /// Tracked changes in index or working tree, machine readable.
    pub fn status_tracked() -> Self {
        Self::new()
            .args(["status", "--porcelain", "--untracked-files=no"])
            .with_timeout(Some(GIT_QUERY_TIMEOUT))
    }

    /// Untracked files that are not ignored.
    pub fn untracked_files() -> Self {
        Self::new()
            .args(["ls-files", "--others", "--exclude-standard"])
            .with_timeout(Some(GIT_QUERY_TIMEOUT))
    }

    /// Upstream tracking marker of a local branch (`>`, `<`, `<>`, `=` or empty).
    pub fn upstream_track(branch: &str) -> Self {
        Self::new()
            .args(["for-each-ref", "--format=%(upstream:trackshort)"])
            .arg(format!("refs/heads/{branch}"))
            .with_timeout(Some(GIT_QUERY_TIMEOUT))
    }

    /// `<name> <sha>` for every local branch.
    pub fn local_heads() -> Self {
        Self::new()
            .args(["for-each-ref", "--format=%(refname:short) %(objectname)", "refs/heads"])
            .with_timeout(Some(GIT_QUERY_TIMEOUT))
    }

    /// `<sha>\trefs/heads/<name>` for every branch on a remote.
    pub fn ls_remote_heads(remote: &str) -> Self {
        Self::new()
            .args(["ls-remote", "--heads", remote])
            .untranslated()
            .non_interactive()
            .with_timeout(Some(GIT_FETCH_TIMEOUT))
    }

    /// Succeeds when `ancestor` is an ancestor of `descendant`.
    pub fn is_ancestor(ancestor: &str, descendant: &str) -> Self {
        Self::new()
            .args(["merge-base", "--is-ancestor", ancestor, descendant])
            .with_timeout(Some(GIT_QUERY_TIMEOUT))
    }
}
