use super::*;
use crate::test_utils::TestGit;
use tempfile::TempDir;

fn repo_with_commit(dir: &Path) -> TestGit {
    let git = TestGit::new(dir);
    git.init().unwrap();
    git.commit_file("README.md", "# test\n", "Initial commit").unwrap();
    git
}

/// A bare "server" repository plus a clone of it on `master` with upstream set.
fn cloned_pair(temp: &TempDir) -> (TestGit, TestGit) {
    let server = TestGit::new(temp.path().join("server.git"));
    server.init_bare().unwrap();

    let work = repo_with_commit(&temp.path().join("work"));
    work.remote_add("origin", &server.repo_path().display().to_string()).unwrap();
    work.push_upstream("origin", "master").unwrap();
    (server, work)
}

#[tokio::test]
async fn test_current_branch_and_detached() {
    let temp = TempDir::new().unwrap();
    let git = repo_with_commit(temp.path());
    let repo = GitRepo::new(temp.path());

    assert!(GitRepo::is_repository_root(temp.path()));
    assert_eq!(repo.current_branch().await.unwrap().as_deref(), Some("master"));

    git.detach_head().unwrap();
    assert_eq!(repo.current_branch().await.unwrap(), None);
}

#[tokio::test]
async fn test_remote_lookup() {
    let temp = TempDir::new().unwrap();
    let git = repo_with_commit(temp.path());
    git.remote_add("upstream", "https://gitlab.example.com/team/a.git").unwrap();
    let repo = GitRepo::new(temp.path());

    assert_eq!(repo.remote("origin").await.unwrap(), None);
    assert_eq!(
        repo.remote("upstream").await.unwrap(),
        Some(Remote {
            name: "upstream".to_string(),
            url: "https://gitlab.example.com/team/a.git".to_string(),
        })
    );
}

#[tokio::test]
async fn test_dirty_and_untracked() {
    let temp = TempDir::new().unwrap();
    let git = repo_with_commit(temp.path());
    let repo = GitRepo::new(temp.path());

    assert!(!repo.is_dirty().await.unwrap());
    assert!(repo.untracked_files().await.unwrap().is_empty());

    git.write_file("notes.txt", "scratch").unwrap();
    assert!(!repo.is_dirty().await.unwrap());
    assert_eq!(repo.untracked_files().await.unwrap(), vec!["notes.txt".to_string()]);

    git.write_file("README.md", "# changed\n").unwrap();
    assert!(repo.is_dirty().await.unwrap());
}

#[tokio::test]
async fn test_ahead_of_upstream() {
    let temp = TempDir::new().unwrap();
    let (_server, work) = cloned_pair(&temp);
    let repo = GitRepo::new(work.repo_path());

    assert!(!repo.is_ahead_of_upstream("master").await.unwrap());

    work.commit_file("src.txt", "local", "Local change").unwrap();
    assert!(repo.is_ahead_of_upstream("master").await.unwrap());

    // No upstream at all
    work.create_branch("feature").unwrap();
    assert!(!repo.is_ahead_of_upstream("feature").await.unwrap());
}

#[tokio::test]
async fn test_outdated_detection() {
    let temp = TempDir::new().unwrap();
    let (server, work) = cloned_pair(&temp);
    let repo = GitRepo::new(work.repo_path());

    assert!(!repo.is_outdated("origin").await.unwrap());

    // A second clone pushes a new commit; the first one is now behind
    let other = repo_with_commit(&temp.path().join("other"));
    other.remote_add("origin", &server.repo_path().display().to_string()).unwrap();
    other.fetch("origin").unwrap();
    other.checkout("origin/master").unwrap();
    other.create_branch("next").unwrap();
    other.commit_file("later.txt", "later", "Later change").unwrap();
    other.push_upstream("origin", "next:master").unwrap();

    assert!(repo.is_outdated("origin").await.unwrap());
}

#[tokio::test]
async fn test_local_commits_are_not_outdated() {
    let temp = TempDir::new().unwrap();
    let (_server, work) = cloned_pair(&temp);
    work.commit_file("ahead.txt", "ahead", "Ahead of origin").unwrap();

    let repo = GitRepo::new(work.repo_path());
    assert!(!repo.is_outdated("origin").await.unwrap());
}

#[tokio::test]
async fn test_fetch_reports_first_ref() {
    let temp = TempDir::new().unwrap();
    let (_server, work) = cloned_pair(&temp);
    let repo = GitRepo::new(work.repo_path());

    let info = repo
        .fetch("origin", "master:remotes/origin/master", &[], "team/work")
        .await
        .unwrap()
        .expect("fetch -v lists the ref");
    assert_eq!(info.flags, vec![FetchFlag::HeadUptodate]);
    assert!(info.reportable_flags().is_empty());
}

#[tokio::test]
async fn test_submodules_are_listed() {
    let temp = TempDir::new().unwrap();
    let lib = repo_with_commit(&temp.path().join("lib"));
    let superproject = repo_with_commit(&temp.path().join("super"));
    superproject
        .add_submodule(&lib.repo_path().display().to_string(), "libs/lib", None)
        .unwrap();
    superproject.set_submodule_branch("libs/lib", ".").unwrap();

    let repo = GitRepo::new(superproject.repo_path());
    let submodules = repo.submodules().await.unwrap();
    assert_eq!(submodules.len(), 1);
    assert_eq!(submodules[0].path, "libs/lib");
    assert_eq!(submodules[0].branch.as_deref(), Some("."));
    assert!(repo.is_submodule_initialized(&submodules[0]));

    let sub = repo.submodule_repo(&submodules[0]);
    assert_eq!(sub.current_branch().await.unwrap().as_deref(), Some("master"));
}

#[tokio::test]
async fn test_clone_failure_is_typed() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("missing.git").display().to_string();
    let err = GitRepo::clone(&missing, temp.path().join("target")).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<crate::core::BulkError>(),
        Some(crate::core::BulkError::GitCloneFailed { .. })
    ));
}
