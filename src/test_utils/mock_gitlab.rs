//! In-memory [`GitLabApi`] for tests.

use anyhow::Result;
use futures::future::{BoxFuture, FutureExt};
use std::collections::{HashMap, HashSet};

use crate::core::BulkError;
use crate::gitlab::{GitLabApi, Job, Pipeline, PipelineScope, RemoteGroup, RemoteProject};

#[derive(Debug, Clone)]
struct StoredPipeline {
    project_id: u64,
    scope: PipelineScope,
    pipeline: Pipeline,
}

/// A fake server populated through builder methods.
///
/// Groups and projects are matched the way GitLab does it: a group search
/// matches on the last path segment, group projects are those whose
/// namespace is the group's full path.
#[derive(Debug, Clone, Default)]
pub struct MockGitLab {
    groups: Vec<RemoteGroup>,
    projects: Vec<RemoteProject>,
    pipelines: Vec<StoredPipeline>,
    failed_jobs: HashMap<(u64, u64), Job>,
    broken_projects: HashSet<u64>,
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn parent(path: &str) -> Option<&str> {
    path.rsplit_once('/').map(|(parent, _)| parent)
}

impl MockGitLab {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group with full path `full_path`.
    #[must_use]
    pub fn with_group(mut self, id: u64, full_path: &str) -> Self {
        self.groups.push(RemoteGroup {
            id,
            name: last_segment(full_path).to_string(),
            path: last_segment(full_path).to_string(),
            full_path: full_path.to_string(),
            web_url: None,
        });
        self
    }

    /// Add a project at `path`.
    #[must_use]
    pub fn with_project(mut self, id: u64, path: &str) -> Self {
        self.projects.push(RemoteProject {
            id,
            path_with_namespace: path.to_string(),
            name: last_segment(path).to_string(),
            default_branch: Some("master".to_string()),
            web_url: None,
        });
        self
    }

    /// Add a pipeline for a project.
    #[must_use]
    pub fn with_pipeline(
        mut self,
        project_id: u64,
        scope: PipelineScope,
        pipeline_id: u64,
        status: &str,
        ref_name: &str,
    ) -> Self {
        self.pipelines.push(StoredPipeline {
            project_id,
            scope,
            pipeline: Pipeline {
                id: pipeline_id,
                status: status.to_string(),
                ref_name: Some(ref_name.to_string()),
                yaml_errors: None,
            },
        });
        self
    }

    /// Attach configuration errors to an existing pipeline.
    #[must_use]
    pub fn with_yaml_errors(mut self, project_id: u64, pipeline_id: u64, errors: &str) -> Self {
        for stored in &mut self.pipelines {
            if stored.project_id == project_id && stored.pipeline.id == pipeline_id {
                stored.pipeline.yaml_errors = Some(errors.to_string());
            }
        }
        self
    }

    /// Record the latest failed job of a pipeline.
    #[must_use]
    pub fn with_failed_job(mut self, project_id: u64, pipeline_id: u64, stage: &str) -> Self {
        self.failed_jobs.insert(
            (project_id, pipeline_id),
            Job {
                id: pipeline_id * 100,
                stage: stage.to_string(),
                name: format!("{stage}-job"),
                status: "failed".to_string(),
            },
        );
        self
    }

    /// Make every pipeline request for a project fail with a server error.
    #[must_use]
    pub fn with_broken_project(mut self, project_id: u64) -> Self {
        self.broken_projects.insert(project_id);
        self
    }

    fn group_by_id(&self, group_id: u64) -> Result<&RemoteGroup> {
        self.groups
            .iter()
            .find(|g| g.id == group_id)
            .ok_or_else(|| BulkError::not_found(format!("Group {group_id} was not found.")).into())
    }

    fn check_project(&self, project_id: u64) -> Result<()> {
        if self.broken_projects.contains(&project_id) {
            return Err(BulkError::GitLabApiError {
                status: 500,
                message: "Internal Server Error".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl GitLabApi for MockGitLab {
    fn list_groups<'a>(&'a self, search: &'a str) -> BoxFuture<'a, Result<Vec<RemoteGroup>>> {
        async move {
            Ok(self.groups.iter().filter(|g| g.path.contains(search)).cloned().collect())
        }
        .boxed()
    }

    fn list_projects(&self) -> BoxFuture<'_, Result<Vec<RemoteProject>>> {
        async move { Ok(self.projects.clone()) }.boxed()
    }

    fn list_subgroups(&self, group_id: u64) -> BoxFuture<'_, Result<Vec<RemoteGroup>>> {
        async move {
            let group = self.group_by_id(group_id)?;
            Ok(self
                .groups
                .iter()
                .filter(|g| parent(&g.full_path) == Some(group.full_path.as_str()))
                .cloned()
                .collect())
        }
        .boxed()
    }

    fn list_group_projects<'a>(
        &'a self,
        group_id: u64,
        search: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Vec<RemoteProject>>> {
        async move {
            let group = self.group_by_id(group_id)?;
            Ok(self
                .projects
                .iter()
                .filter(|p| parent(&p.path_with_namespace) == Some(group.full_path.as_str()))
                .filter(|p| search.is_none_or(|s| p.name.contains(s)))
                .cloned()
                .collect())
        }
        .boxed()
    }

    fn latest_pipeline<'a>(
        &'a self,
        project_id: u64,
        scope: PipelineScope,
        ref_name: Option<&'a str>,
    ) -> BoxFuture<'a, Result<Option<Pipeline>>> {
        async move {
            self.check_project(project_id)?;
            Ok(self
                .pipelines
                .iter()
                .filter(|s| s.project_id == project_id && s.scope == scope)
                .filter(|s| ref_name.is_none_or(|r| s.pipeline.ref_name.as_deref() == Some(r)))
                .map(|s| Pipeline {
                    // the list endpoint never carries yaml_errors
                    yaml_errors: None,
                    ..s.pipeline.clone()
                })
                .max_by_key(|p| p.id))
        }
        .boxed()
    }

    fn get_pipeline(&self, project_id: u64, pipeline_id: u64) -> BoxFuture<'_, Result<Pipeline>> {
        async move {
            self.check_project(project_id)?;
            self.pipelines
                .iter()
                .find(|s| s.project_id == project_id && s.pipeline.id == pipeline_id)
                .map(|s| s.pipeline.clone())
                .ok_or_else(|| {
                    BulkError::not_found(format!("Pipeline {pipeline_id} was not found.")).into()
                })
        }
        .boxed()
    }

    fn latest_failed_job(
        &self,
        project_id: u64,
        pipeline_id: u64,
    ) -> BoxFuture<'_, Result<Option<Job>>> {
        async move {
            self.check_project(project_id)?;
            Ok(self.failed_jobs.get(&(project_id, pipeline_id)).cloned())
        }
        .boxed()
    }
}
