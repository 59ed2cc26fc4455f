//! Cross-platform utilities
//!
//! - [`platform`] - git executable lookup and user path expansion
//! - [`path`] - lexical path normalization used by the work-dir path mapper

pub mod path;
pub mod platform;

pub use path::{absolutize, strip_dir_prefix, to_slash};
pub use platform::{command_exists, get_git_command, get_home_dir, is_windows, resolve_path};
