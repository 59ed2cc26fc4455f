//! Group and project lookups by path.

use anyhow::Result;
use std::sync::Arc;

use super::{GitLabApi, RemoteGroup, RemoteProject};
use crate::core::BulkError;

/// Whether `path` is `group` itself or lies below it.
///
/// `team/a` is below `team`; `teamx/a` is not.
#[must_use]
pub fn is_within_group(path: &str, group: &str) -> bool {
    path == group || path.strip_prefix(group).is_some_and(|rest| rest.starts_with('/'))
}

/// Path based view of the server's groups and projects.
#[derive(Clone)]
pub struct RemoteCatalog {
    api: Arc<dyn GitLabApi>,
}

impl RemoteCatalog {
    pub fn new(api: Arc<dyn GitLabApi>) -> Self {
        Self {
            api,
        }
    }

    /// The underlying API handle.
    #[must_use]
    pub fn api(&self) -> &Arc<dyn GitLabApi> {
        &self.api
    }

    /// The group whose full path is `path`.
    pub async fn group(&self, path: &str) -> Result<RemoteGroup> {
        let search = path.rsplit('/').next().unwrap_or(path);
        self.api
            .list_groups(search)
            .await?
            .into_iter()
            .find(|g| g.full_path == path)
            .ok_or_else(|| BulkError::not_found(format!("Group '{path}' does not exist.")).into())
    }

    /// The project whose full path is `path`.
    pub async fn project(&self, path: &str) -> Result<RemoteProject> {
        let not_found = || BulkError::not_found(format!("Project '{path}' does not exist."));
        let (group_path, name) = path.rsplit_once('/').ok_or_else(not_found)?;

        let group = match self.group(group_path).await {
            Ok(group) => group,
            Err(e) if is_not_found(&e) => return Err(not_found().into()),
            Err(e) => return Err(e),
        };
        self.api
            .list_group_projects(group.id, Some(name))
            .await?
            .into_iter()
            .find(|p| p.path_with_namespace == path)
            .ok_or_else(|| not_found().into())
    }

    /// Direct subgroups of the group at `path`.
    pub async fn subgroups(&self, path: &str) -> Result<Vec<RemoteGroup>> {
        let group = self.group(path).await?;
        self.api.list_subgroups(group.id).await
    }

    /// Direct projects of the group at `path`.
    pub async fn projects(&self, path: &str) -> Result<Vec<RemoteProject>> {
        let group = self.group(path).await?;
        self.api.list_group_projects(group.id, None).await
    }

    /// Every visible project at or below `group_path`, in server order.
    ///
    /// All projects are listed and filtered locally, which also catches
    /// projects shared into the group's namespace tree.
    pub async fn list_projects(&self, group_path: &str) -> Result<Vec<RemoteProject>> {
        let projects = self.api.list_projects().await?;
        let total = projects.len();
        let filtered: Vec<_> =
            projects.into_iter().filter(|p| is_within_group(p.path(), group_path)).collect();
        tracing::debug!(
            "{} of {} visible projects are below '{}'",
            filtered.len(),
            total,
            group_path
        );
        Ok(filtered)
    }

    /// Paths of [`Self::list_projects`].
    pub async fn project_paths(&self, group_path: &str) -> Result<Vec<String>> {
        Ok(self
            .list_projects(group_path)
            .await?
            .into_iter()
            .map(|p| p.path_with_namespace)
            .collect())
    }
}

fn is_not_found(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<BulkError>(), Some(BulkError::NotFoundError { .. }))
}
