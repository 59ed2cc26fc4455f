//! Platform-specific helpers.
//!
//! Git executable naming, command lookup and user path expansion for the
//! `--config` option.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Returns `true` when compiled for Windows.
#[must_use]
pub const fn is_windows() -> bool {
    cfg!(windows)
}

/// Name of the git executable for the current platform.
#[must_use]
pub const fn get_git_command() -> &'static str {
    if is_windows() {
        "git.exe"
    } else {
        "git"
    }
}

/// Whether `cmd` can be found on the PATH.
#[must_use]
pub fn command_exists(cmd: &str) -> bool {
    which::which(cmd).is_ok()
}

/// The current user's home directory.
pub fn get_home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| {
        anyhow::anyhow!("Could not determine home directory; set HOME (or USERPROFILE on Windows)")
    })
}

/// Expand a leading `~/` and `$VAR` references in a user supplied path.
///
/// Only the current user's home (`~/`) is supported; `~user` forms are
/// rejected.
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = if let Some(stripped) = path.strip_prefix("~/") {
        get_home_dir()?.join(stripped)
    } else if path.starts_with('~') {
        return Err(anyhow::anyhow!(
            "Invalid path: {path}\n\nTilde expansion only supports '~/' for the home directory"
        ));
    } else {
        PathBuf::from(path)
    };

    let path_str = expanded.to_string_lossy();
    let expanded = shellexpand::env(&path_str)
        .with_context(|| format!("Failed to expand environment variables in path: {path_str}"))?;

    Ok(PathBuf::from(expanded.into_owned()))
}
