//! Test utilities for glbulk
//!
//! - [`TestGit`] builds repository fixtures with the real `git` executable.
//! - [`MockGitLab`] is an in-memory [`GitLabApi`](crate::gitlab::GitLabApi).
//!
//! Available to unit tests and, with the `test-utils` feature, to the
//! integration tests.

pub mod git_helper;
pub mod mock_gitlab;

pub use git_helper::TestGit;
pub use mock_gitlab::MockGitLab;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` when given, otherwise `RUST_LOG`; without either, tests
/// stay silent.
///
/// ```bash
/// RUST_LOG=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .with_ansi(true)
            .try_init();
    });
}
