use glbulk_cli::bulk::StatusOptions;
use glbulk_cli::bulk::status::keys;
use glbulk_cli::gitlab::PipelineScope;
use glbulk_cli::test_utils::{MockGitLab, TestGit};

use crate::common::WorkdirFixture;

#[tokio::test]
async fn test_status_reconciles_local_and_remote_projects() {
    let fixture = WorkdirFixture::new("team").await;
    fixture.serve("team/svc-a");
    let svc_a = fixture.local_repo("team/svc-a");
    svc_a.push_upstream("origin", "master").unwrap();
    fixture.local_repo("team/svc-b");

    let api = MockGitLab::new()
        .with_group(1, "team")
        .with_project(10, "team/svc-a")
        .with_project(11, "team/svc-c")
        .with_project(12, "other/svc-d");
    let report = fixture.operations(api).status(None, &StatusOptions::default()).await.unwrap();

    assert_eq!(report.get(keys::LOCAL_ONLY).unwrap(), ["team/svc-b"]);
    assert_eq!(report.get(keys::REMOTE_ONLY).unwrap(), ["team/svc-c"]);
    assert!(!report.contains_key(keys::ERRORS));
    assert!(!report.contains_key(keys::OUTDATED));
    assert!(!report.contains_key(keys::NEED_PUSH));
}

#[tokio::test]
async fn test_missing_primary_alias_is_reported() {
    let fixture = WorkdirFixture::new("team").await;
    let repo = fixture.unlinked_repo("team/svc-x");
    repo.remote_add("upstream", "https://gitlab.example.com/elsewhere/svc-x.git").unwrap();
    fixture.local_repo("team/svc-y");

    let report = fixture.operations(MockGitLab::new()).errors(None, None).await.unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.get("team/svc-x").unwrap(), ["Remote alias 'origin' is not set."]);
}

#[tokio::test]
async fn test_clone_skips_existing_repository() {
    let fixture = WorkdirFixture::new("team").await;
    fixture.unlinked_repo("team/svc-a");
    let before = TestGit::new(fixture.local("team/svc-a")).rev_parse_head().unwrap();

    let api = MockGitLab::new().with_project(10, "team/svc-a");
    let report = fixture.local_server_operations(api).clone_projects(None).await.unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.get("team/svc-a").unwrap(), ["Project already exists."]);
    let after = TestGit::new(fixture.local("team/svc-a")).rev_parse_head().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_project_without_pipelines() {
    let fixture = WorkdirFixture::new("team").await;
    let api = MockGitLab::new()
        .with_project(10, "team/quiet")
        .with_project(11, "team/busy")
        .with_pipeline(11, PipelineScope::Tags, 5, "success", "v1.0");

    let report = fixture.operations(api).ci_status(None, None).await.unwrap();

    assert_eq!(report.get("no-pipeline").unwrap(), ["team/quiet"]);
    assert_eq!(report.get("success").unwrap(), ["team/busy"]);
}

#[tokio::test]
async fn test_nested_groups_map_to_directories() {
    let fixture = WorkdirFixture::new("team").await;
    fixture.local_repo("team/backend/api");
    fixture.local_repo("team/backend/worker");
    fixture.local_repo("team/website");

    let ops = fixture.operations(MockGitLab::new());
    assert_eq!(
        ops.local_projects(None).unwrap(),
        vec!["team/backend/api", "team/backend/worker", "team/website"]
    );
    assert_eq!(
        ops.local_projects(Some("team/backend")).unwrap(),
        vec!["team/backend/api", "team/backend/worker"]
    );
    assert!(ops.local_projects(Some("other")).is_err());
}
