//! glbulk - bulk operations over a GitLab group hierarchy
//!
//! glbulk mirrors a GitLab group and all its subgroups and projects into a
//! local directory tree, the *work-dir*, and runs consistency checks and git
//! operations across every repository in it.
//!
//! # Architecture Overview
//!
//! A work-dir root holds a `.gitlab` file naming the base group it mirrors
//! and the server it talks to. The relative path of a directory below the
//! root is the path of the subgroup or project below the base group:
//!
//! ```text
//! team-wd/                 <- .gitlab: base_group = "team"
//! ├── .gitlab
//! ├── website/             <- team/website (project)
//! └── backend/             <- team/backend (subgroup)
//!     └── api/             <- team/backend/api (project)
//! ```
//!
//! Commands resolve their scope first (work-dir, group path, project set);
//! failures there abort the command. Each repository is then processed in
//! isolation and its failures become findings in the report instead of
//! stopping the batch.
//!
//! # Core Modules
//!
//! - [`workdir`] - work-dir discovery, path mapping, local project discovery
//! - [`gitlab`] - the GitLab REST client and the remote catalog
//! - [`bulk`] - the engine: inspection, batch runner, CI classification, verbs
//! - [`git`] - async wrapper around the system `git` executable
//! - [`config`] - the `.gitlab` file and the user's global server list
//! - [`core`] - the error taxonomy and finding formatting
//! - [`cli`] - the `glbulk` command line
//!
//! # Configuration (`.gitlab`)
//!
//! ```toml
//! [global]
//! default = "origin"
//! base_group = "team"
//! timeout = 30
//!
//! [origin]
//! url = "https://gitlab.example.com"
//! private_token = "glpat-xxxxxxxxxxxx"
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! glbulk init team team-wd
//! cd team-wd
//! glbulk clone
//! glbulk status --ci
//! glbulk pull --branch master --ff-only
//! ```

pub mod bulk;
pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod git;
pub mod gitlab;
pub mod utils;
pub mod workdir;

// test_utils module is available for both unit tests and integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
