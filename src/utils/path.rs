//! Lexical path helpers used by the work-dir path mapper.
//!
//! Nothing here touches the file system; symlinks are not resolved.

use std::path::{Component, Path, PathBuf};

/// Render a path with `/` separators regardless of platform.
#[must_use]
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Strip trailing `/` characters, keeping a lone root `/`.
#[must_use]
pub fn trim_trailing_slashes(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() && path.starts_with('/') {
        "/"
    } else {
        trimmed
    }
}

/// If `path` lies strictly below `dir`, return the `/`-separated remainder.
///
/// Both arguments must already use `/` separators. A plain string prefix is
/// not enough: `/work/teamx` is not below `/work/team`.
#[must_use]
pub fn strip_dir_prefix<'a>(path: &'a str, dir: &str) -> Option<&'a str> {
    let path = trim_trailing_slashes(path);
    let dir = trim_trailing_slashes(dir);
    let rest = path.strip_prefix(dir)?;
    let rest = if dir.ends_with('/') {
        rest
    } else {
        rest.strip_prefix('/')?
    };
    (!rest.is_empty()).then_some(rest)
}

/// Whether a `/`-separated path has a `.` or `..` segment.
#[must_use]
pub fn has_dot_segments(path: &str) -> bool {
    path.split('/').any(|segment| segment == "." || segment == "..")
}

/// Make `path` absolute against `base` and fold `.` and `..` components.
#[must_use]
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut cleaned = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                cleaned.pop();
            }
            other => cleaned.push(other.as_os_str()),
        }
    }
    cleaned
}
