//! Local versus remote project sets.

use std::collections::HashSet;

/// Split two project path lists into `(local_only, remote_only)`.
///
/// Each side keeps the order of its input.
#[must_use]
pub fn diff(local: &[String], remote: &[String]) -> (Vec<String>, Vec<String>) {
    let local_set: HashSet<&str> = local.iter().map(String::as_str).collect();
    let remote_set: HashSet<&str> = remote.iter().map(String::as_str).collect();

    let local_only = local.iter().filter(|p| !remote_set.contains(p.as_str())).cloned().collect();
    let remote_only = remote.iter().filter(|p| !local_set.contains(p.as_str())).cloned().collect();
    (local_only, remote_only)
}
