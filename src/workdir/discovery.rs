//! Finding the git repositories managed by a work-dir.

use anyhow::Result;
use std::path::PathBuf;
use walkdir::WalkDir;

use super::WorkdirContext;
use crate::core::BulkError;
use crate::git::GitRepo;

/// One local repository with its group path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectEntry {
    /// Working tree root
    pub local_path: PathBuf,
    /// Group path the location maps to
    pub group_path: String,
    /// Handle used for git operations
    pub repo: GitRepo,
}

impl WorkdirContext {
    /// Repository roots below `group_path` (the base group when `None`).
    ///
    /// A repository's own subdirectories are never searched, so no returned
    /// path is nested in another. Siblings come back sorted by name.
    /// Directories that cannot be read are skipped with a warning.
    pub fn find_repositories(&self, group_path: Option<&str>) -> Result<Vec<PathBuf>> {
        let group_path = group_path.unwrap_or_else(|| self.base_group());
        let start = self.to_local_path(group_path)?;
        if !start.is_dir() {
            return Err(BulkError::configuration(format!(
                "Group-path '{group_path}' does not correspond to a local group nor project."
            ))
            .into());
        }
        if GitRepo::is_repository_root(&start) {
            return Ok(vec![start]);
        }

        let mut found = Vec::new();
        let mut walker = WalkDir::new(&start).sort_by_file_name().into_iter();
        while let Some(entry) = walker.next() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::warn!("Skipping unreadable entry below {}: {error}", start.display());
                    continue;
                }
            };
            if !entry.file_type().is_dir() {
                continue;
            }
            if GitRepo::is_repository_root(entry.path()) {
                found.push(entry.into_path());
                walker.skip_current_dir();
            }
        }

        tracing::debug!("Found {} repositories below '{}'", found.len(), group_path);
        Ok(found)
    }

    /// Repositories below `group_path` together with their group paths.
    pub fn project_set(&self, group_path: Option<&str>) -> Result<Vec<ProjectEntry>> {
        self.find_repositories(group_path)?
            .into_iter()
            .map(|local_path| {
                let group_path = self.to_group_path_from(&local_path, self.root())?;
                Ok(ProjectEntry {
                    repo: GitRepo::new(&local_path),
                    local_path,
                    group_path,
                })
            })
            .collect()
    }

    /// Group paths of the local repositories below `group_path`.
    pub fn local_project_paths(&self, group_path: Option<&str>) -> Result<Vec<String>> {
        Ok(self.project_set(group_path)?.into_iter().map(|entry| entry.group_path).collect())
    }
}
