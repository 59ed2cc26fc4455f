//! Configuration files read by glbulk.
//!
//! Two files are involved:
//!
//! - **Work-dir configuration** (`<work-dir>/.gitlab`, see [`workdir`]): names
//!   the GitLab server, the base group the work-dir mirrors and the primary
//!   remote alias. Its presence is what makes a directory a work-dir.
//! - **Global configuration** (`~/.glbulk/config.toml`, see [`global`]): the
//!   servers known to the user, consulted by `glbulk init` to seed a new
//!   work-dir.
//!
//! Both are TOML and may carry credentials, so both are written with
//! owner-only permissions on Unix.

pub mod global;
pub mod workdir;

pub use global::GlobalConfig;
pub use workdir::{ServerConfig, WorkdirConfig, WorkdirSettings};
