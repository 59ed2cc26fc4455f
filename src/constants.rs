//! Global constants used throughout the glbulk codebase.
//!
//! File names, timeouts, retry parameters and defaults that more than one
//! module relies on live here so the numbers stay discoverable.

use std::time::Duration;

/// Name of the work-dir configuration file stored at the work-dir root.
pub const WORKDIR_CONFIG_FILE: &str = ".gitlab";

/// Remote alias every managed repository is expected to carry.
pub const ORIGIN_REMOTE: &str = "origin";

/// Default primary remote alias and server table name.
pub const DEFAULT_REMOTE_NAME: &str = "origin";

/// Default GitLab REST API version.
pub const DEFAULT_API_VERSION: &str = "4";

/// Default branch used by `fetch` and `pull` when none is given.
pub const DEFAULT_BRANCH: &str = "master";

/// Name of the version-control metadata entry inside a repository root.
pub const GIT_METADATA_DIR: &str = ".git";

/// Default HTTP timeout for GitLab API requests (30 seconds).
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Page size requested from paginated GitLab endpoints.
pub const API_PAGE_SIZE: u32 = 100;

/// Timeout for Git fetch and pull operations (5 minutes).
pub const GIT_FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Timeout for Git clone operations (10 minutes).
///
/// Clones transfer the whole history and take longer than fetches.
pub const GIT_CLONE_TIMEOUT: Duration = Duration::from_secs(600);

/// Timeout for local, read-only Git queries (30 seconds).
pub const GIT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Starting delay for exponential backoff of API retries (100ms).
pub const STARTING_BACKOFF_DELAY_MS: u64 = 100;

/// Maximum backoff delay for API retries (2 seconds).
pub const MAX_BACKOFF_DELAY_MS: u64 = 2000;

/// Number of retries for transient API failures.
pub const API_RETRY_ATTEMPTS: usize = 3;

/// Default number of repositories processed concurrently.
///
/// One keeps the historical sequential behavior.
pub const DEFAULT_MAX_PARALLEL: usize = 1;
