//! Integration test suite for glbulk
//!
//! End-to-end tests over real git repositories and an in-memory GitLab API.
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! - **scenarios**: status, errors, clone and CI classification end to end
//! - **sync**: clone, fetch and pull against locally served repositories
//! - **runner**: isolation of per-repository failures
//! - **cli**: the `glbulk` binary

#[path = "../common/mod.rs"]
mod common;

mod cli;
mod runner;
mod scenarios;
mod sync;
