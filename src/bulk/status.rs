//! The `errors` and `status` verbs.

use anyhow::Result;
use std::collections::HashSet;
use std::sync::Arc;

use super::runner::outcomes_to_report;
use super::{AliasPolicy, BulkOperations, PipelineStatusResolver, Report, RepoTask, fold_ci_errors};
use crate::core::describe_failure;
use crate::workdir::diff;

/// Status report keys.
pub mod keys {
    pub const ERRORS: &str = "errors";
    pub const MODIFIED: &str = "modified";
    pub const UNTRACKED: &str = "untracked_files";
    pub const NEED_PUSH: &str = "need_push";
    pub const OUTDATED: &str = "outdated";
    pub const LOCAL_ONLY: &str = "local-only";
    pub const REMOTE_ONLY: &str = "remote-only";
    pub const CI_ERRORS: &str = "ci-errors";
}

/// Options of the `status` verb.
#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// Branch every repository is expected to be on
    pub branch: Option<String>,
    /// Skip everything that needs the GitLab server or the remotes
    pub no_remote: bool,
    /// Also classify CI pipelines (ignored with `no_remote`)
    pub ci: bool,
}

impl BulkOperations {
    /// Consistency findings per local repository.
    pub async fn errors(&self, group_path: Option<&str>, branch: Option<&str>) -> Result<Report> {
        let entries = self.workdir().project_set(Some(&self.group_or_base(group_path)))?;
        let inspector = Arc::new(self.inspector()?);
        let branch = branch.map(str::to_string);

        let op = Arc::new(move |task: RepoTask| {
            let inspector = Arc::clone(&inspector);
            let branch = branch.clone();
            async move { inspector.inspect(&task.repo, &task.group_path, branch.as_deref()).await }
        });
        let outcomes = self
            .runner()
            .run_repos(entries, self.workdir().remote_name(), AliasPolicy::Optional, op)
            .await;
        Ok(outcomes_to_report(outcomes, |findings| findings))
    }

    /// Overview of the local work-dir, optionally compared with the server.
    ///
    /// Every key lists group paths. `errors` holds the repositories `errors`
    /// would report on and those where a status check failed; the flags that
    /// could be checked are reported for them all the same.
    pub async fn status(&self, group_path: Option<&str>, options: &StatusOptions) -> Result<Report> {
        let group = self.group_or_base(group_path);
        let entries = self.workdir().project_set(Some(&group))?;
        let local_paths: Vec<String> = entries.iter().map(|e| e.group_path.clone()).collect();

        let remote_projects = if options.no_remote {
            None
        } else {
            Some(self.catalog().list_projects(&group).await?)
        };
        let remote_paths: Option<Arc<HashSet<String>>> = remote_projects.as_ref().map(|projects| {
            Arc::new(projects.iter().map(|p| p.path_with_namespace.clone()).collect())
        });

        let inspector = Arc::new(self.inspector()?);
        let branch = options.branch.clone();
        let remotes = remote_paths.clone();
        let op = Arc::new(move |task: RepoTask| {
            let inspector = Arc::clone(&inspector);
            let branch = branch.clone();
            let remotes = remotes.clone();
            async move {
                let findings = inspector
                    .inspect(&task.repo, &task.group_path, branch.as_deref())
                    .await
                    .unwrap_or_else(|error| vec![describe_failure(&error)]);
                let check_outdated =
                    remotes.as_ref().is_some_and(|set| set.contains(&task.group_path));
                let (status, failures) = inspector.status(&task.repo, check_outdated).await;
                Ok::<_, anyhow::Error>((!findings.is_empty() || !failures.is_empty(), status))
            }
        });
        let outcomes = self
            .runner()
            .run_repos(entries, self.workdir().remote_name(), AliasPolicy::Optional, op)
            .await;

        let mut report = Report::new();
        for outcome in outcomes {
            let path = outcome.group_path;
            let has_errors = !outcome.findings.is_empty()
                || outcome.value.as_ref().is_none_or(|(has_findings, _)| *has_findings);
            if has_errors {
                report.push(keys::ERRORS, path.clone());
            }
            if let Some((_, status)) = outcome.value {
                for (flag, key) in [
                    (status.dirty, keys::MODIFIED),
                    (status.untracked, keys::UNTRACKED),
                    (status.need_push, keys::NEED_PUSH),
                    (status.outdated, keys::OUTDATED),
                ] {
                    if flag {
                        report.push(key, path.clone());
                    }
                }
            }
        }

        if let Some(projects) = remote_projects {
            let remote_list: Vec<String> =
                projects.iter().map(|p| p.path_with_namespace.clone()).collect();
            let (local_only, remote_only) = diff(&local_paths, &remote_list);
            report.insert(keys::LOCAL_ONLY, local_only);
            report.insert(keys::REMOTE_ONLY, remote_only);

            if options.ci {
                let resolver = PipelineStatusResolver::new(
                    Arc::clone(self.catalog().api()),
                    self.runner().max_parallel(),
                );
                let labels = resolver.resolve(&projects, options.branch.as_deref()).await?;
                report.insert(keys::CI_ERRORS, fold_ci_errors(&labels));
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bulk::BatchRunner;
    use crate::config::{ServerConfig, WorkdirConfig};
    use crate::gitlab::PipelineScope;
    use crate::test_utils::{MockGitLab, TestGit};
    use crate::workdir::WorkdirContext;
    use tempfile::TempDir;

    fn clean_repo(root: &std::path::Path, name: &str) -> TestGit {
        let git = TestGit::new(root.join(name));
        git.init().unwrap();
        git.commit_file("README.md", "# x\n", "Initial commit").unwrap();
        git.remote_add("origin", &format!("https://gitlab.example.com/team/{name}.git")).unwrap();
        git
    }

    fn operations(root: &std::path::Path, api: MockGitLab) -> BulkOperations {
        crate::test_utils::init_test_logging(None);
        let config =
            WorkdirConfig::new("team", "origin", ServerConfig::new("https://gitlab.example.com"));
        BulkOperations::new(WorkdirContext::new(root, config), Arc::new(api), BatchRunner::new(2))
    }

    #[tokio::test]
    async fn test_errors_report_only_problems() {
        let temp = TempDir::new().unwrap();
        clean_repo(temp.path(), "good");
        let bad = clean_repo(temp.path(), "bad");
        bad.create_branch("feature").unwrap();

        let ops = operations(temp.path(), MockGitLab::new());
        let report = ops.errors(None, Some("master")).await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report.get("team/bad").unwrap(), ["Current branch is 'feature', not 'master'."]);
    }

    #[tokio::test]
    async fn test_status_without_remote() {
        let temp = TempDir::new().unwrap();
        clean_repo(temp.path(), "clean");
        let dirty = clean_repo(temp.path(), "dirty");
        dirty.write_file("README.md", "# changed\n").unwrap();
        let untracked = clean_repo(temp.path(), "untracked");
        untracked.write_file("new.txt", "new").unwrap();

        let ops = operations(temp.path(), MockGitLab::new());
        let options = StatusOptions {
            no_remote: true,
            ..StatusOptions::default()
        };
        let report = ops.status(None, &options).await.unwrap();

        assert_eq!(report.get(keys::MODIFIED).unwrap(), ["team/dirty"]);
        assert_eq!(report.get(keys::UNTRACKED).unwrap(), ["team/untracked"]);
        assert!(!report.contains_key(keys::ERRORS));
        assert!(!report.contains_key(keys::LOCAL_ONLY));
        assert!(!report.contains_key(keys::REMOTE_ONLY));
    }

    #[tokio::test]
    async fn test_status_with_remote_and_ci() {
        let temp = TempDir::new().unwrap();
        let workdir = temp.path().join("work");
        let served = temp.path().join("served");

        // `team/shared` exists on the server and is one commit ahead locally
        // after the reset, so it is reported as outdated.
        let bare = TestGit::new(served.join("team").join("shared.git"));
        bare.init_bare().unwrap();
        let shared = clean_repo(&workdir, "shared");
        shared.redirect_url("https://gitlab.example.com", &served).unwrap();
        shared.commit_file("later.txt", "later", "Later change").unwrap();
        shared.push_upstream("origin", "master").unwrap();
        shared.reset_hard("HEAD~1").unwrap();

        clean_repo(&workdir, "mine");

        let api = MockGitLab::new()
            .with_project(1, "team/shared")
            .with_project(2, "team/theirs")
            .with_pipeline(2, PipelineScope::Branches, 7, "failed", "master")
            .with_failed_job(2, 7, "build");
        let ops = operations(&workdir, api);
        let options = StatusOptions {
            ci: true,
            ..StatusOptions::default()
        };

        let report = ops.status(None, &options).await.unwrap();
        assert_eq!(report.get(keys::OUTDATED).unwrap(), ["team/shared"]);
        assert_eq!(report.get(keys::LOCAL_ONLY).unwrap(), ["team/mine"]);
        assert_eq!(report.get(keys::REMOTE_ONLY).unwrap(), ["team/theirs"]);
        assert_eq!(report.get(keys::CI_ERRORS).unwrap(), ["team/theirs"]);
        assert!(!report.contains_key(keys::ERRORS));
        assert!(!report.contains_key(keys::NEED_PUSH));
    }

    #[tokio::test]
    async fn test_unreachable_remote_keeps_local_flags() {
        let temp = TempDir::new().unwrap();
        let app = TestGit::new(temp.path().join("app"));
        app.init().unwrap();
        app.commit_file("README.md", "# x\n", "Initial commit").unwrap();
        app.write_file("README.md", "# changed\n").unwrap();
        app.write_file("notes.txt", "notes").unwrap();

        let ops = operations(temp.path(), MockGitLab::new().with_project(1, "team/app"));
        let report = ops.status(None, &StatusOptions::default()).await.unwrap();

        assert_eq!(report.get(keys::ERRORS).unwrap(), ["team/app"]);
        assert_eq!(report.get(keys::MODIFIED).unwrap(), ["team/app"]);
        assert_eq!(report.get(keys::UNTRACKED).unwrap(), ["team/app"]);
        assert!(!report.contains_key(keys::OUTDATED));
        assert!(!report.contains_key(keys::REMOTE_ONLY));
    }
}
