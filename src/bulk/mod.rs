//! The bulk operations engine.
//!
//! [`BulkOperations`] ties a [`WorkdirContext`], a [`RemoteCatalog`] and a
//! [`BatchRunner`] together and exposes one method per verb:
//!
//! | verb | method | output |
//! |------|--------|--------|
//! | `group`, `project`, `subgroups`, `projects` | lookups | GitLab resources |
//! | `local-projects`, `remote-projects` | path lists | group paths |
//! | `errors` | [`BulkOperations::errors`] | report per group path |
//! | `status` | [`BulkOperations::status`] | report per status key |
//! | `ci-status` | [`BulkOperations::ci_status`] | report per CI label |
//! | `clone`, `fetch`, `pull` | [`sync`] | report per group path |
//!
//! Resolution failures (no work-dir, a group outside it, an unknown group)
//! are returned as errors. Failures inside one repository are reported as
//! findings under that repository's group path.

pub mod ci;
pub mod inspect;
pub mod report;
pub mod runner;
pub mod status;
pub mod sync;

pub use ci::{PipelineStatusResolver, fold_ci_errors};
pub use inspect::{RepoInspector, RepoStatus};
pub use report::Report;
pub use runner::{AliasPolicy, BatchRunner, RepoOutcome, RepoTask};
pub use status::StatusOptions;
pub use sync::{FastForward, FetchOptions, PullOptions, RecurseSubmodules, TransferOptions};

use anyhow::Result;
use std::sync::Arc;

use crate::gitlab::{GitLabApi, RemoteCatalog, RemoteGroup, RemoteProject};
use crate::workdir::WorkdirContext;

/// Entry point for every work-dir bound verb.
#[derive(Clone)]
pub struct BulkOperations {
    workdir: WorkdirContext,
    catalog: RemoteCatalog,
    runner: BatchRunner,
}

impl BulkOperations {
    pub fn new(workdir: WorkdirContext, api: Arc<dyn GitLabApi>, runner: BatchRunner) -> Self {
        Self {
            workdir,
            catalog: RemoteCatalog::new(api),
            runner,
        }
    }

    #[must_use]
    pub const fn workdir(&self) -> &WorkdirContext {
        &self.workdir
    }

    #[must_use]
    pub const fn catalog(&self) -> &RemoteCatalog {
        &self.catalog
    }

    #[must_use]
    pub const fn runner(&self) -> &BatchRunner {
        &self.runner
    }

    /// `group_path`, or the work-dir's base group.
    fn group_or_base(&self, group_path: Option<&str>) -> String {
        group_path.unwrap_or_else(|| self.workdir.base_group()).trim_end_matches('/').to_string()
    }

    fn inspector(&self) -> Result<RepoInspector> {
        Ok(RepoInspector::new(self.workdir.server()?.normalized_url(), self.workdir.remote_name()))
    }

    /// The group at `path` (default: the base group).
    pub async fn group(&self, path: Option<&str>) -> Result<RemoteGroup> {
        self.catalog.group(&self.group_or_base(path)).await
    }

    /// The project at `path`.
    pub async fn project(&self, path: &str) -> Result<RemoteProject> {
        self.catalog.project(path.trim_end_matches('/')).await
    }

    /// Direct subgroups of `path` (default: the base group).
    pub async fn subgroups(&self, path: Option<&str>) -> Result<Vec<RemoteGroup>> {
        self.catalog.subgroups(&self.group_or_base(path)).await
    }

    /// Direct projects of `path` (default: the base group).
    pub async fn projects(&self, path: Option<&str>) -> Result<Vec<RemoteProject>> {
        self.catalog.projects(&self.group_or_base(path)).await
    }

    /// Group paths of the local repositories below `group_path`.
    pub fn local_projects(&self, group_path: Option<&str>) -> Result<Vec<String>> {
        self.workdir.local_project_paths(Some(&self.group_or_base(group_path)))
    }

    /// Group paths of the remote projects below `group_path`.
    pub async fn remote_projects(&self, group_path: Option<&str>) -> Result<Vec<String>> {
        self.catalog.project_paths(&self.group_or_base(group_path)).await
    }
}
