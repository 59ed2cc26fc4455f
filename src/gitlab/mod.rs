//! Access to the GitLab server.
//!
//! [`GitLabApi`] is the seam between glbulk and the REST API: the catalog
//! and the CI resolver only ever talk to the trait. [`client::GitLabClient`]
//! implements it over HTTP; tests use an in-memory implementation.

pub mod catalog;
pub mod client;
pub mod types;

pub use catalog::RemoteCatalog;
pub use client::GitLabClient;
pub use types::{Job, Pipeline, PipelineScope, RemoteGroup, RemoteProject};

use anyhow::Result;
use futures::future::BoxFuture;

/// The GitLab endpoints glbulk needs.
///
/// Lookups of a missing resource fail with
/// [`BulkError::NotFoundError`](crate::core::BulkError::NotFoundError).
pub trait GitLabApi: Send + Sync {
    /// Groups whose name or path matches `search`.
    fn list_groups<'a>(&'a self, search: &'a str) -> BoxFuture<'a, Result<Vec<RemoteGroup>>>;

    /// Every project visible to the user.
    fn list_projects(&self) -> BoxFuture<'_, Result<Vec<RemoteProject>>>;

    /// Direct subgroups of a group.
    fn list_subgroups(&self, group_id: u64) -> BoxFuture<'_, Result<Vec<RemoteGroup>>>;

    /// Direct projects of a group, optionally filtered by `search`.
    fn list_group_projects<'a>(
        &'a self,
        group_id: u64,
        search: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<RemoteProject>>>;

    /// The pipeline with the highest id in `scope`, optionally for one ref.
    fn latest_pipeline<'a>(
        &'a self,
        project_id: u64,
        scope: PipelineScope,
        ref_name: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<Pipeline>>>;

    /// One pipeline with its full details.
    fn get_pipeline(&self, project_id: u64, pipeline_id: u64) -> BoxFuture<'_, Result<Pipeline>>;

    /// The most recent failed job of a pipeline.
    fn latest_failed_job(
        &self,
        project_id: u64,
        pipeline_id: u64,
    ) -> BoxFuture<'_, Result<Option<Job>>>;
}
