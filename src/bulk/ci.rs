//! CI pipeline classification of remote projects.
//!
//! A project's label is derived from its most recent pipeline, whichever of
//! the latest branch pipeline and the latest tag pipeline has the higher id:
//!
//! - no pipeline at all: `no-pipeline`
//! - any status but `failed`: the status itself (`success`, `running`, ...)
//! - `failed` with configuration errors: `yaml-errors`
//! - `failed` otherwise: `failed in stage '<stage>'` of the latest failed job,
//!   or plain `failed` when the server lists no failed job

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;

use super::{BulkOperations, Report};
use crate::gitlab::{GitLabApi, PipelineScope, RemoteProject};

/// Label of projects without any pipeline.
pub const NO_PIPELINE: &str = "no-pipeline";
/// Label of pipelines rejected for configuration errors.
pub const YAML_ERRORS: &str = "yaml-errors";
/// Status value GitLab uses for failed pipelines.
pub const FAILED: &str = "failed";

/// Classifies projects by their latest pipeline.
#[derive(Clone)]
pub struct PipelineStatusResolver {
    api: Arc<dyn GitLabApi>,
    max_parallel: usize,
}

impl PipelineStatusResolver {
    pub fn new(api: Arc<dyn GitLabApi>, max_parallel: usize) -> Self {
        Self {
            api,
            max_parallel: max_parallel.max(1),
        }
    }

    /// Label of one project. `branch` restricts branch pipelines to that ref.
    pub async fn classify(&self, project: &RemoteProject, branch: Option<&str>) -> Result<String> {
        let by_branch = self.api.latest_pipeline(project.id, PipelineScope::Branches, branch).await?;
        let by_tag = self.api.latest_pipeline(project.id, PipelineScope::Tags, None).await?;

        let Some(latest) = by_branch.into_iter().chain(by_tag).max_by_key(|p| p.id) else {
            return Ok(NO_PIPELINE.to_string());
        };
        if latest.status != FAILED {
            return Ok(latest.status);
        }

        let details = self.api.get_pipeline(project.id, latest.id).await?;
        if details.yaml_errors.as_deref().is_some_and(|e| !e.is_empty()) {
            return Ok(YAML_ERRORS.to_string());
        }

        Ok(match self.api.latest_failed_job(project.id, latest.id).await? {
            Some(job) => format!("failed in stage '{}'", job.stage),
            None => FAILED.to_string(),
        })
    }

    /// Map label -> project paths. Any API failure aborts the whole run.
    pub async fn resolve(&self, projects: &[RemoteProject], branch: Option<&str>) -> Result<Report> {
        let labels: Vec<(String, String)> = stream::iter(projects)
            .map(|project| async move {
                let label = self
                    .classify(project, branch)
                    .await
                    .with_context(|| format!("Failed to read CI status of '{}'", project.path()))?;
                tracing::debug!("{}: {}", project.path(), label);
                Ok::<_, anyhow::Error>((label, project.path_with_namespace.clone()))
            })
            .buffered(self.max_parallel)
            .try_collect()
            .await?;

        let mut report = Report::new();
        for (label, path) in labels {
            report.push(label, path);
        }
        Ok(report)
    }
}

/// Project paths whose label counts as a CI error, sorted and deduplicated.
#[must_use]
pub fn fold_ci_errors(labels: &Report) -> Vec<String> {
    let mut paths: Vec<String> = labels
        .iter()
        .filter(|(label, _)| label.starts_with(FAILED) || *label == YAML_ERRORS)
        .flat_map(|(_, paths)| paths.iter().cloned())
        .collect();
    paths.sort();
    paths.dedup();
    paths
}

impl BulkOperations {
    /// CI labels of the remote projects below `group_path`.
    pub async fn ci_status(&self, group_path: Option<&str>, branch: Option<&str>) -> Result<Report> {
        let group = self.group_or_base(group_path);
        let projects = self.catalog().list_projects(&group).await?;
        PipelineStatusResolver::new(Arc::clone(self.catalog().api()), self.runner().max_parallel())
            .resolve(&projects, branch)
            .await
    }
}
