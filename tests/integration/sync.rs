use glbulk_cli::bulk::{FetchOptions, PullOptions};
use glbulk_cli::test_utils::{MockGitLab, TestGit};

use crate::common::WorkdirFixture;

/// Push a new commit to the served `group_path` from a scratch clone.
fn advance_server(fixture: &WorkdirFixture, group_path: &str, scratch: &str) {
    let upstream = fixture.served().join(format!("{group_path}.git"));
    let other = TestGit::new(fixture.served().join(scratch));
    other.init().unwrap();
    other.remote_add("origin", &upstream.display().to_string()).unwrap();
    other.fetch("origin").unwrap();
    other.reset_hard("origin/master").unwrap();
    other.commit_file("NEWS.md", "- released\n", "Release notes").unwrap();
    other.push_upstream("origin", "master").unwrap();
}

#[tokio::test]
async fn test_clone_then_pull_round() {
    let fixture = WorkdirFixture::new("team").await;

    // Seed the server with one populated project and one empty project.
    let seed = TestGit::new(fixture.served().join("seed"));
    seed.init().unwrap();
    seed.commit_file("README.md", "# api\n", "Initial commit").unwrap();
    fixture.serve("team/backend/api");
    let api_url = fixture.served().join("team/backend/api.git");
    seed.remote_add("origin", &api_url.display().to_string()).unwrap();
    seed.push_upstream("origin", "master").unwrap();
    fixture.serve("team/docs");

    let api = MockGitLab::new().with_project(1, "team/backend/api").with_project(2, "team/docs");
    let ops = fixture.local_server_operations(api);

    let report = ops.clone_projects(None).await.unwrap();
    assert!(report.is_empty(), "{report:?}");
    assert!(fixture.local("team/backend/api").join("README.md").exists());
    assert!(fixture.local("team/docs").join(".git").exists());
    assert_eq!(
        ops.local_projects(None).unwrap(),
        vec!["team/backend/api", "team/docs"]
    );

    advance_server(&fixture, "team/backend/api", "scratch");

    let report = ops.fetch(Some("team/backend"), &FetchOptions::default()).await.unwrap();
    assert_eq!(report.get("team/backend/api").unwrap(), ["FAST_FORWARD"]);
    assert!(!fixture.local("team/backend/api").join("NEWS.md").exists());

    // The remote-tracking ref is current now, so pull has no ref update to report.
    let report = ops.pull(Some("team/backend"), &PullOptions::default()).await.unwrap();
    assert!(report.is_empty(), "{report:?}");
    assert!(fixture.local("team/backend/api").join("NEWS.md").exists());
}

#[tokio::test]
async fn test_fetch_and_pull_findings() {
    let fixture = WorkdirFixture::new("team").await;
    fixture.serve("team/app");
    let app = fixture.local_repo("team/app");
    app.push_upstream("origin", "master").unwrap();
    fixture.unlinked_repo("team/lonely");
    let gone = fixture.local_repo("team/gone");
    gone.create_branch("topic").unwrap();

    let ops = fixture.operations(MockGitLab::new());

    let report = ops.fetch(None, &FetchOptions::default()).await.unwrap();
    assert!(!report.contains_key("team/app"));
    assert_eq!(report.get("team/lonely").unwrap(), ["Remote alias 'origin' is not set."]);
    let gone_findings = report.get("team/gone").unwrap();
    assert_eq!(gone_findings.len(), 1);
    assert!(gone_findings[0].starts_with("GitCommandError: "), "{}", gone_findings[0]);

    let report = ops.pull(None, &PullOptions::default()).await.unwrap();
    assert_eq!(report.get("team/gone").unwrap(), ["Current branch is not 'master'"]);
    assert_eq!(report.get("team/lonely").unwrap(), ["Remote alias 'origin' is not set."]);
    assert!(!report.contains_key("team/app"));
}
