use glbulk_cli::bulk::{AliasPolicy, BatchRunner, RepoTask};
use glbulk_cli::core::BulkError;
use glbulk_cli::test_utils::MockGitLab;
use std::sync::Arc;

use crate::common::WorkdirFixture;

#[tokio::test]
async fn test_failures_stay_with_their_item() {
    let runner = BatchRunner::new(3);
    let items: Vec<(String, u32)> = (0..6).map(|i| (format!("team/p{i}"), i)).collect();

    let results = runner
        .run_isolated(items, |i| async move {
            match i {
                2 => panic!("boom"),
                4 => Err(anyhow::Error::from(BulkError::operation("broken repository"))),
                _ => Ok(i * 10),
            }
        })
        .await;

    let keys: Vec<&str> = results.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, ["team/p0", "team/p1", "team/p2", "team/p3", "team/p4", "team/p5"]);
    assert_eq!(results[1].1, Ok(10));
    assert_eq!(results[2].1, Err("OperationError: boom".to_string()));
    assert_eq!(results[4].1, Err("OperationError: broken repository".to_string()));
    assert_eq!(results[5].1, Ok(50));
}

#[tokio::test]
async fn test_required_alias_is_reported_once_per_repository() {
    let fixture = WorkdirFixture::new("team").await;
    fixture.local_repo("team/linked");
    fixture.unlinked_repo("team/unlinked");

    let entries = fixture.operations(MockGitLab::new()).workdir().project_set(None).unwrap();
    let op = Arc::new(|task: RepoTask| async move {
        Ok::<_, anyhow::Error>(task.remote.map(|r| r.name))
    });
    let outcomes =
        BatchRunner::new(2).run_repos(entries, "origin", AliasPolicy::Required, op).await;

    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].group_path, "team/linked");
    assert_eq!(outcomes[0].value, Some(Some("origin".to_string())));
    assert!(outcomes[0].findings.is_empty());
    assert_eq!(outcomes[1].group_path, "team/unlinked");
    assert_eq!(outcomes[1].findings, ["Remote alias 'origin' is not set."]);
}
