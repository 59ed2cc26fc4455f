//! Shared fixtures for the glbulk integration tests.

// Not every test module uses every helper.
#![allow(dead_code)]

use assert_cmd::Command;
use glbulk_cli::bulk::{BatchRunner, BulkOperations};
use glbulk_cli::config::{ServerConfig, WorkdirConfig};
use glbulk_cli::constants::WORKDIR_CONFIG_FILE;
use glbulk_cli::test_utils::{MockGitLab, TestGit};
use glbulk_cli::workdir::WorkdirContext;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

pub const SERVER_URL: &str = "https://gitlab.example.com";

/// A work-dir at `<temp>/work` plus a directory of bare repositories at
/// `<temp>/served` standing in for the GitLab server's git transport.
pub struct WorkdirFixture {
    _temp: TempDir,
    root: PathBuf,
    served: PathBuf,
    base_group: String,
}

impl WorkdirFixture {
    pub async fn new(base_group: &str) -> Self {
        glbulk_cli::test_utils::init_test_logging(None);
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("work");
        let served = temp.path().join("served");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(&served).unwrap();

        WorkdirConfig::new(base_group, "origin", ServerConfig::new(SERVER_URL))
            .save_to(&root.join(WORKDIR_CONFIG_FILE))
            .await
            .unwrap();

        Self {
            _temp: temp,
            root,
            served,
            base_group: base_group.to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn served(&self) -> &Path {
        &self.served
    }

    /// Local directory of `group_path`.
    pub fn local(&self, group_path: &str) -> PathBuf {
        let relative = group_path
            .strip_prefix(&self.base_group)
            .unwrap_or(group_path)
            .trim_start_matches('/');
        self.root.join(relative)
    }

    /// A committed repository at `group_path` without remotes.
    pub fn unlinked_repo(&self, group_path: &str) -> TestGit {
        let git = TestGit::new(self.local(group_path));
        git.init().unwrap();
        git.commit_file("README.md", &format!("# {group_path}\n"), "Initial commit").unwrap();
        git
    }

    /// A committed repository whose `origin` points at the server's copy of
    /// `group_path`, transported from `served/`.
    pub fn local_repo(&self, group_path: &str) -> TestGit {
        let git = self.unlinked_repo(group_path);
        git.remote_add("origin", &format!("{SERVER_URL}/{group_path}.git")).unwrap();
        git.redirect_url(SERVER_URL, &self.served).unwrap();
        git
    }

    /// Create the server-side repository of `group_path`.
    pub fn serve(&self, group_path: &str) -> TestGit {
        let bare = TestGit::new(self.served.join(format!("{group_path}.git")));
        bare.init_bare().unwrap();
        bare
    }

    fn context(&self, server_url: &str) -> WorkdirContext {
        WorkdirContext::new(
            &self.root,
            WorkdirConfig::new(self.base_group.clone(), "origin", ServerConfig::new(server_url)),
        )
    }

    /// The engine over this work-dir, talking to `api`.
    pub fn operations(&self, api: MockGitLab) -> BulkOperations {
        BulkOperations::new(self.context(SERVER_URL), Arc::new(api), BatchRunner::new(4))
    }

    /// The engine with the server URL pointing at `served/` so clones stay local.
    pub fn local_server_operations(&self, api: MockGitLab) -> BulkOperations {
        let server = self.served.display().to_string();
        BulkOperations::new(self.context(&server), Arc::new(api), BatchRunner::new(4))
    }
}

/// The `glbulk` binary running in `dir` with colors disabled.
pub fn glbulk(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("glbulk").unwrap();
    cmd.current_dir(dir).env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}
