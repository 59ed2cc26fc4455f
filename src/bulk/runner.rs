//! Isolated execution of one operation over many repositories.
//!
//! Every repository runs in its own tokio task. An error or a panic in one
//! task becomes a `"<kind>: <message>"` finding for that repository and
//! never disturbs the others. At most `max_parallel` tasks run at a time and
//! results come back in input order, so reports are reproducible regardless
//! of scheduling.

use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use super::Report;
use crate::constants::DEFAULT_MAX_PARALLEL;
use crate::core::{BulkError, describe_failure, describe_panic};
use crate::git::{GitRepo, Remote};
use crate::workdir::ProjectEntry;

/// How a missing primary remote alias is treated before the operation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AliasPolicy {
    /// Record "Remote alias 'x' is not set." and run with no remote.
    Required,
    /// Run with no remote and record nothing; the operation reports it.
    Optional,
}

/// What a per-repository operation receives.
#[derive(Debug, Clone)]
pub struct RepoTask {
    pub local_path: PathBuf,
    pub group_path: String,
    pub repo: GitRepo,
    /// The primary remote, when the repository has it
    pub remote: Option<Remote>,
}

/// Result of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoOutcome<T> {
    pub group_path: String,
    /// Operation result; `None` when it failed
    pub value: Option<T>,
    /// Alias problems and failures, in the order they occurred
    pub findings: Vec<String>,
}

/// Bounded, order preserving, failure isolating executor.
#[derive(Debug, Clone, Copy)]
pub struct BatchRunner {
    max_parallel: usize,
}

impl Default for BatchRunner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PARALLEL)
    }
}

impl BatchRunner {
    /// A runner with at most `max_parallel` concurrent tasks (minimum 1).
    #[must_use]
    pub fn new(max_parallel: usize) -> Self {
        Self {
            max_parallel: max_parallel.max(1),
        }
    }

    #[must_use]
    pub const fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Run `op` for every keyed item, each in its own task.
    ///
    /// Failures come back as finding strings under the item's key.
    pub async fn run_isolated<I, T, F, Fut>(
        &self,
        items: Vec<(String, I)>,
        op: F,
    ) -> Vec<(String, std::result::Result<T, String>)>
    where
        I: Send + 'static,
        T: Send + 'static,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        tracing::info!(
            "Processing {} item(s), up to {} at a time",
            items.len(),
            self.max_parallel
        );

        stream::iter(items)
            .map(|(key, item)| {
                let handle = tokio::spawn(op(item));
                async move {
                    let result = match handle.await {
                        Ok(Ok(value)) => Ok(value),
                        Ok(Err(error)) => {
                            tracing::warn!("{}: {:#}", key, error);
                            Err(describe_failure(&error))
                        }
                        Err(join_error) if join_error.is_panic() => {
                            let finding = describe_panic(&*join_error.into_panic());
                            tracing::warn!("{}: {}", key, finding);
                            Err(finding)
                        }
                        Err(_) => Err("OperationError: task was cancelled".to_string()),
                    };
                    (key, result)
                }
            })
            .buffered(self.max_parallel)
            .collect()
            .await
    }

    /// Run `op` over local repositories after resolving their primary remote.
    pub async fn run_repos<T, F, Fut>(
        &self,
        entries: Vec<ProjectEntry>,
        remote_name: &str,
        policy: AliasPolicy,
        op: Arc<F>,
    ) -> Vec<RepoOutcome<T>>
    where
        T: Send + 'static,
        F: Fn(RepoTask) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
    {
        let items = entries.into_iter().map(|entry| (entry.group_path.clone(), entry)).collect();
        let remote_name = remote_name.to_string();

        self.run_isolated(items, move |entry: ProjectEntry| {
            let op = Arc::clone(&op);
            let remote_name = remote_name.clone();
            async move {
                let mut findings = Vec::new();
                let remote = match entry.repo.remote(&remote_name).await {
                    Ok(remote) => remote,
                    Err(error) => {
                        findings.push(describe_failure(&error));
                        None
                    }
                };
                if remote.is_none() && policy == AliasPolicy::Required && findings.is_empty() {
                    findings.push(
                        BulkError::RemoteAliasError {
                            alias: remote_name.clone(),
                        }
                        .to_string(),
                    );
                }

                let task = RepoTask {
                    local_path: entry.local_path,
                    group_path: entry.group_path.clone(),
                    repo: entry.repo,
                    remote,
                };
                let value = match op(task).await {
                    Ok(value) => Some(value),
                    Err(error) => {
                        tracing::warn!("{}: {:#}", entry.group_path, error);
                        findings.push(describe_failure(&error));
                        None
                    }
                };
                Ok::<_, anyhow::Error>(RepoOutcome {
                    group_path: entry.group_path,
                    value,
                    findings,
                })
            }
        })
        .await
        .into_iter()
        .map(|(group_path, result)| match result {
            Ok(outcome) => outcome,
            Err(finding) => RepoOutcome {
                group_path,
                value: None,
                findings: vec![finding],
            },
        })
        .collect()
    }
}

/// Collect outcomes into a report keyed by group path.
///
/// Each key lists the operation's own lines first, then the findings.
pub fn outcomes_to_report<T>(
    outcomes: Vec<RepoOutcome<T>>,
    lines: impl Fn(T) -> Vec<String>,
) -> Report {
    let mut report = Report::new();
    for outcome in outcomes {
        let mut values = outcome.value.map(&lines).unwrap_or_default();
        values.extend(outcome.findings);
        report.insert(outcome.group_path, values);
    }
    report
}
