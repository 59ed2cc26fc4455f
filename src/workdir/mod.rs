//! The local work-dir and everything that maps it onto GitLab.
//!
//! A work-dir is a directory tree whose root holds a `.gitlab` file. The
//! root mirrors the configured base group; every subdirectory mirrors the
//! subgroup or project of the same relative path.
//!
//! [`WorkdirContext`] is discovered once per command and passed explicitly
//! to the components that need it:
//!
//! - [`paths`]: the bijection between group paths and local paths
//! - [`discovery`]: finding managed repositories below a group
//! - [`reconcile`]: local-only / remote-only project sets

pub mod discovery;
pub mod paths;
pub mod reconcile;

pub use discovery::ProjectEntry;
pub use reconcile::diff;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::{ServerConfig, WorkdirConfig};
use crate::constants::{ORIGIN_REMOTE, WORKDIR_CONFIG_FILE};
use crate::core::BulkError;

/// Message used whenever an operation needs a work-dir and none encloses it.
pub const NOT_IN_WORKDIR: &str = "The current directory must be within a gitlab work-dir.";

/// A loaded work-dir: its root and its configuration.
#[derive(Debug, Clone)]
pub struct WorkdirContext {
    root: PathBuf,
    config: WorkdirConfig,
}

impl WorkdirContext {
    /// Build a context from parts; `root` should be absolute.
    pub fn new(root: impl Into<PathBuf>, config: WorkdirConfig) -> Self {
        Self {
            root: root.into(),
            config,
        }
    }

    /// Walk up from `start` to the first directory holding `.gitlab`.
    #[must_use]
    pub fn find_root(start: &Path) -> Option<PathBuf> {
        let mut current = start.to_path_buf();
        loop {
            if current.join(WORKDIR_CONFIG_FILE).is_file() {
                return Some(current);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load the work-dir enclosing `start`.
    pub async fn discover(start: &Path) -> Result<Self> {
        let root = Self::find_root(start).ok_or_else(|| BulkError::configuration(NOT_IN_WORKDIR))?;
        let config = WorkdirConfig::load_from_root(&root).await?;
        tracing::debug!(
            "Work-dir {} mirrors group '{}'",
            root.display(),
            config.global.base_group
        );
        Ok(Self::new(root, config))
    }

    /// Load the work-dir enclosing the process current directory.
    pub async fn from_current_dir() -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read the current directory")?;
        Self::discover(&cwd).await
    }

    /// Fail when `start` already lies inside a work-dir.
    pub fn ensure_not_nested(start: &Path) -> Result<()> {
        if Self::find_root(start).is_some() {
            return Err(
                BulkError::configuration("Cannot create a work-dir within another work-dir.").into()
            );
        }
        Ok(())
    }

    /// Create `<start>/<name>` as a new work-dir mirroring `group_path`.
    ///
    /// The server settings are stored under the `origin` alias.
    pub async fn init(
        start: &Path,
        group_path: &str,
        name: &str,
        server: &ServerConfig,
    ) -> Result<Self> {
        Self::ensure_not_nested(start)?;

        let root = start.join(name);
        if root.exists() {
            return Err(BulkError::path(format!("'{}' already exists.", root.display())).into());
        }
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create {}", root.display()))?;

        let config =
            WorkdirConfig::new(group_path.trim_end_matches('/'), ORIGIN_REMOTE, server.clone());
        config.save_to(&root.join(WORKDIR_CONFIG_FILE)).await?;
        tracing::info!("Initialized work-dir {} for group '{}'", root.display(), group_path);
        Ok(Self::new(root, config))
    }

    /// The work-dir root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The parsed `.gitlab` file.
    #[must_use]
    pub const fn config(&self) -> &WorkdirConfig {
        &self.config
    }

    /// The group path mirrored by the root.
    #[must_use]
    pub fn base_group(&self) -> &str {
        self.config.global.base_group.trim_end_matches('/')
    }

    /// The primary remote alias.
    #[must_use]
    pub fn remote_name(&self) -> &str {
        &self.config.global.default
    }

    /// Connection settings of the configured server.
    pub fn server(&self) -> Result<&ServerConfig> {
        self.config.server()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_discover_from_nested_directory() {
        let temp = TempDir::new().unwrap();
        let config =
            WorkdirConfig::new("team", "origin", ServerConfig::new("https://gitlab.example.com"));
        config.save_to(&temp.path().join(WORKDIR_CONFIG_FILE)).await.unwrap();

        let nested = temp.path().join("backend").join("api");
        std::fs::create_dir_all(&nested).unwrap();

        let ctx = WorkdirContext::discover(&nested).await.unwrap();
        assert_eq!(ctx.root(), temp.path());
        assert_eq!(ctx.base_group(), "team");
        assert_eq!(ctx.remote_name(), "origin");
        assert_eq!(ctx.server().unwrap().url, "https://gitlab.example.com");
    }

    #[tokio::test]
    async fn test_discover_outside_workdir() {
        let temp = TempDir::new().unwrap();
        let err = WorkdirContext::discover(temp.path()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BulkError>(),
            Some(BulkError::ConfigurationError { message }) if message == NOT_IN_WORKDIR
        ));
    }

    #[tokio::test]
    async fn test_init_creates_workdir() {
        let temp = TempDir::new().unwrap();
        let server = ServerConfig::new("https://gitlab.example.com/");

        let ctx = WorkdirContext::init(temp.path(), "team/", "wd", &server).await.unwrap();
        assert_eq!(ctx.root(), temp.path().join("wd"));

        let loaded = WorkdirContext::discover(&temp.path().join("wd")).await.unwrap();
        assert_eq!(loaded.base_group(), "team");
        assert_eq!(loaded.remote_name(), "origin");
        assert_eq!(loaded.server().unwrap().normalized_url(), "https://gitlab.example.com");
    }

    #[tokio::test]
    async fn test_init_refuses_nested_and_existing() {
        let temp = TempDir::new().unwrap();
        let server = ServerConfig::new("https://gitlab.example.com");
        WorkdirContext::init(temp.path(), "team", "wd", &server).await.unwrap();

        let nested =
            WorkdirContext::init(&temp.path().join("wd"), "team", "inner", &server).await.unwrap_err();
        assert_eq!(nested.to_string(), "Cannot create a work-dir within another work-dir.");

        let existing = WorkdirContext::init(temp.path(), "team", "wd", &server).await.unwrap_err();
        assert!(matches!(existing.downcast_ref::<BulkError>(), Some(BulkError::PathError { .. })));
    }
}
