use predicates::prelude::*;
use tempfile::TempDir;

use crate::common::{WorkdirFixture, glbulk};

#[test]
fn test_version() {
    let temp = TempDir::new().unwrap();
    glbulk(temp.path()).arg("--version").assert().success().stdout(predicate::str::contains("glbulk"));
}

#[test]
fn test_outside_workdir_fails() {
    let temp = TempDir::new().unwrap();
    glbulk(temp.path())
        .arg("errors")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("must be within a gitlab work-dir"))
        .stderr(predicate::str::contains("glbulk init"));
}

#[test]
fn test_init_with_url_then_list_local_projects() {
    let temp = TempDir::new().unwrap();
    glbulk(temp.path())
        .args(["init", "team", "team-wd", "--url", "https://gitlab.example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized work-dir"));

    let root = temp.path().join("team-wd");
    let config = std::fs::read_to_string(root.join(".gitlab")).unwrap();
    assert!(config.contains("base_group = \"team\""));
    assert!(config.contains("url = \"https://gitlab.example.com\""));

    std::fs::create_dir_all(root.join("backend").join("api").join(".git")).unwrap();
    glbulk(&root.join("backend"))
        .args(["local-projects"])
        .assert()
        .success()
        .stdout("team/backend/api\n");

    glbulk(&root)
        .args(["init", "team", "nested"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot create a work-dir within another work-dir."));
}

#[test]
fn test_nested_init_is_refused_before_server_lookup() {
    let temp = TempDir::new().unwrap();
    glbulk(temp.path())
        .args(["init", "team", "team-wd", "--url", "https://gitlab.example.com"])
        .assert()
        .success();

    // The global config names no server, so only the nesting check can fail.
    let config_path = temp.path().join("empty.toml");
    std::fs::write(&config_path, "").unwrap();
    glbulk(&temp.path().join("team-wd"))
        .arg("--config")
        .arg(&config_path)
        .args(["init", "team", "nested"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Cannot create a work-dir within another work-dir."));
    assert!(!temp.path().join("team-wd").join("nested").exists());
}

#[test]
fn test_init_from_global_config() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("config.toml");
    std::fs::write(
        &config_path,
        "default = \"work\"\n\n[servers.work]\nurl = \"https://gitlab.work.example\"\nprivate_token = \"glpat-test\"\n",
    )
    .unwrap();

    glbulk(temp.path())
        .args(["--quiet", "--config"])
        .arg(&config_path)
        .args(["init", "platform", "wd"])
        .assert()
        .success()
        .stdout("");

    let written = std::fs::read_to_string(temp.path().join("wd").join(".gitlab")).unwrap();
    assert!(written.contains("url = \"https://gitlab.work.example\""));
    assert!(written.contains("private_token = \"glpat-test\""));
}

#[tokio::test]
async fn test_errors_exit_status_and_json_output() {
    let fixture = WorkdirFixture::new("team").await;
    fixture.unlinked_repo("team/lonely");
    fixture.local_repo("team/fine");

    let output = glbulk(fixture.root())
        .args(["--format", "json", "errors"])
        .assert()
        .code(1)
        .get_output()
        .stdout
        .clone();
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["team/lonely"][0], "Remote alias 'origin' is not set.");
    assert!(report.get("team/fine").is_none());

    glbulk(fixture.root()).args(["errors", "fine"]).assert().code(1);
    glbulk(fixture.root()).args(["errors", "team/fine"]).assert().success().stdout("");
}

#[tokio::test]
async fn test_status_without_remote_in_yaml() {
    let fixture = WorkdirFixture::new("team").await;
    let repo = fixture.local_repo("team/app");
    repo.write_file("scratch.txt", "notes").unwrap();

    glbulk(fixture.root())
        .args(["--format", "yaml", "status", "--no-remote"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("untracked_files:"))
        .stdout(predicate::str::contains("- team/app"));
}
