//! Mapping between GitLab group paths and work-dir locations.
//!
//! The base group maps to the work-dir root and `base/a/b` maps to
//! `<root>/a/b`. Both directions are purely lexical: the directories do not
//! need to exist.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::WorkdirContext;
use crate::core::BulkError;
use crate::utils::path::{
    absolutize, has_dot_segments, strip_dir_prefix, to_slash, trim_trailing_slashes,
};

impl WorkdirContext {
    /// Local directory of `group_path`.
    ///
    /// Fails with a path error when the group is not below the base group.
    pub fn to_local_path(&self, group_path: &str) -> Result<PathBuf> {
        let group_path = trim_trailing_slashes(group_path);
        let base = self.base_group();
        if group_path == base {
            return Ok(self.root().to_path_buf());
        }

        let rest = group_path
            .strip_prefix(base)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|rest| !rest.is_empty())
            .ok_or_else(|| {
                BulkError::path(format!("'{group_path}' is not stored in the current work-dir."))
            })?;

        let mut local = self.root().to_path_buf();
        local.extend(rest.split('/').filter(|segment| !segment.is_empty()));
        Ok(local)
    }

    /// Group path of a local directory, relative paths taken from the current
    /// directory.
    pub fn to_group_path(&self, local_path: &Path) -> Result<String> {
        let cwd = std::env::current_dir().context("Failed to read the current directory")?;
        self.to_group_path_from(local_path, &cwd)
    }

    /// Group path of a local directory, relative paths taken from `base_dir`.
    ///
    /// The raw strings are compared first; when that fails, or either side has
    /// `.`/`..` segments, both sides are made absolute and the dots folded.
    pub fn to_group_path_from(&self, local_path: &Path, base_dir: &Path) -> Result<String> {
        let path = to_slash(local_path);
        let root = to_slash(self.root());
        let raw = !has_dot_segments(&path) && !has_dot_segments(&root);

        let rest = if raw && trim_trailing_slashes(&path) == trim_trailing_slashes(&root) {
            None
        } else if let Some(rest) = strip_dir_prefix(&path, &root).filter(|_| raw) {
            Some(rest.to_string())
        } else {
            let abs_path = to_slash(&absolutize(local_path, base_dir));
            let abs_root = to_slash(&absolutize(self.root(), base_dir));
            if abs_path == abs_root {
                None
            } else {
                let rest = strip_dir_prefix(&abs_path, &abs_root).ok_or_else(|| {
                    BulkError::path(format!(
                        "'{}' is not a subdirectory of the current work-dir.",
                        local_path.display()
                    ))
                })?;
                Some(rest.to_string())
            }
        };

        Ok(match rest {
            None => self.base_group().to_string(),
            Some(rest) => format!("{}/{}", self.base_group(), rest),
        })
    }
}
