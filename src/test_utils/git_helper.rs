//! Git test helper utilities
//!
//! A thin synchronous wrapper over the `git` executable for building
//! repository fixtures in tests.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Runs git commands inside one directory for test setup.
pub struct TestGit {
    repo_path: PathBuf,
}

impl TestGit {
    fn run_git_command(&self, args: &[&str], action: &str) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.repo_path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .with_context(|| action.to_string())?;

        if !output.status.success() {
            bail!("{} failed: {}", action, String::from_utf8_lossy(&output.stderr));
        }

        Ok(output)
    }

    /// Wrap `repo_path`; the directory is created if missing.
    pub fn new(repo_path: impl Into<PathBuf>) -> Self {
        let repo_path = repo_path.into();
        let _ = std::fs::create_dir_all(&repo_path);
        Self {
            repo_path,
        }
    }

    /// The working tree path.
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// `git init` on branch `master` with a test identity.
    pub fn init(&self) -> Result<()> {
        self.run_git_command(&["init", "-q"], "Failed to initialize git repository")?;
        self.run_git_command(
            &["symbolic-ref", "HEAD", "refs/heads/master"],
            "Failed to point HEAD at master",
        )?;
        self.config_user()
    }

    /// `git init --bare` on branch `master`.
    pub fn init_bare(&self) -> Result<()> {
        self.run_git_command(&["init", "-q", "--bare"], "Failed to initialize bare repository")?;
        self.run_git_command(
            &["symbolic-ref", "HEAD", "refs/heads/master"],
            "Failed to point HEAD at master",
        )?;
        Ok(())
    }

    /// Configure a local author identity.
    pub fn config_user(&self) -> Result<()> {
        self.run_git_command(
            &["config", "user.email", "test@glbulk.example"],
            "Failed to configure git user email",
        )?;
        self.run_git_command(
            &["config", "user.name", "Test User"],
            "Failed to configure git user name",
        )?;
        Ok(())
    }

    /// Write `content` to `relative` inside the working tree.
    pub fn write_file(&self, relative: &str, content: &str) -> Result<()> {
        let path = self.repo_path.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    /// Stage everything.
    pub fn add_all(&self) -> Result<()> {
        self.run_git_command(&["add", "."], "Failed to add files to git")?;
        Ok(())
    }

    /// Commit staged changes.
    pub fn commit(&self, message: &str) -> Result<()> {
        self.run_git_command(&["commit", "-q", "-m", message], "Failed to create git commit")?;
        Ok(())
    }

    /// Write, stage and commit one file.
    pub fn commit_file(&self, relative: &str, content: &str, message: &str) -> Result<()> {
        self.write_file(relative, content)?;
        self.add_all()?;
        self.commit(message)
    }

    /// `git remote add <name> <url>`
    pub fn remote_add(&self, name: &str, url: &str) -> Result<()> {
        self.run_git_command(
            &["remote", "add", name, url],
            &format!("Failed to add remote: {}", name),
        )?;
        Ok(())
    }

    /// Push `branch` to `remote` and set it as upstream.
    pub fn push_upstream(&self, remote: &str, branch: &str) -> Result<()> {
        self.run_git_command(
            &["push", "-q", "-u", remote, branch],
            &format!("Failed to push {} to {}", branch, remote),
        )?;
        Ok(())
    }

    /// `git fetch <remote>`
    pub fn fetch(&self, remote: &str) -> Result<()> {
        self.run_git_command(&["fetch", "-q", remote], "Failed to fetch from remote")?;
        Ok(())
    }

    /// `git checkout <ref>`
    pub fn checkout(&self, ref_name: &str) -> Result<()> {
        self.run_git_command(
            &["checkout", "-q", ref_name],
            &format!("Failed to checkout: {}", ref_name),
        )?;
        Ok(())
    }

    /// `git checkout -b <branch>`
    pub fn create_branch(&self, branch_name: &str) -> Result<()> {
        self.run_git_command(
            &["checkout", "-q", "-b", branch_name],
            &format!("Failed to create branch: {}", branch_name),
        )?;
        Ok(())
    }

    /// Detach HEAD at the current commit.
    pub fn detach_head(&self) -> Result<()> {
        self.run_git_command(&["checkout", "-q", "--detach"], "Failed to detach HEAD")?;
        Ok(())
    }

    /// `git config <key> <value>` in this repository.
    pub fn config(&self, key: &str, value: &str) -> Result<()> {
        self.run_git_command(&["config", key, value], &format!("Failed to set {}", key))?;
        Ok(())
    }

    /// Serve `https://<host>/...` URLs from `local_root/...` in this repository.
    ///
    /// The configured remote URL stays untouched; only the transport is
    /// redirected.
    pub fn redirect_url(&self, server_url: &str, local_root: &Path) -> Result<()> {
        let base = format!("{}/", local_root.display());
        let key = format!("url.{}.insteadOf", base);
        self.config(&key, &format!("{}/", server_url.trim_end_matches('/')))
    }

    /// `git reset --hard <rev>`
    pub fn reset_hard(&self, rev: &str) -> Result<()> {
        self.run_git_command(&["reset", "-q", "--hard", rev], &format!("Failed to reset to {}", rev))?;
        Ok(())
    }

    /// Current HEAD commit.
    pub fn rev_parse_head(&self) -> Result<String> {
        let output =
            self.run_git_command(&["rev-parse", "HEAD"], "Failed to get current commit SHA")?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Add a submodule from a local repository and commit it.
    ///
    /// `branch` is written to `.gitmodules` when given.
    pub fn add_submodule(&self, url: &str, path: &str, branch: Option<&str>) -> Result<()> {
        let mut args = vec!["-c", "protocol.file.allow=always", "submodule", "add", "-q"];
        if let Some(branch) = branch {
            args.extend(["-b", branch]);
        }
        args.extend([url, path]);
        self.run_git_command(&args, &format!("Failed to add submodule {}", path))?;
        self.commit(&format!("Add submodule {}", path))
    }

    /// Set `submodule.<name>.branch` in `.gitmodules` and commit it.
    pub fn set_submodule_branch(&self, name: &str, branch: &str) -> Result<()> {
        let key = format!("submodule.{name}.branch");
        self.run_git_command(
            &["config", "--file", ".gitmodules", &key, branch],
            &format!("Failed to set branch of submodule {}", name),
        )?;
        self.add_all()?;
        self.commit(&format!("Track {} in submodule {}", branch, name))
    }
}
