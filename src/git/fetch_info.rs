//! Per-ref outcome of `git fetch -v` / `git pull -v`.
//!
//! Git prints one summary line per ref it considered:
//!
//! ```text
//!  = [up to date]      master     -> origin/master
//!    4f2a1c0..9be3d11  master     -> origin/master
//!  + 4f2a1c0...9be3d11 master     -> origin/master  (forced update)
//!  ! [rejected]        master     -> origin/master  (non-fast-forward)
//!  * [new branch]      master     -> origin/master
//!  * [new tag]         v1.0       -> v1.0
//!  t [tag update]      v1.0       -> v1.0
//! ```
//!
//! The leading character and the bracketed summary decide the flags.

use std::fmt;

/// Outcome flags of one fetched ref.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FetchFlag {
    /// The ref could not be updated
    Error,
    /// The update was refused (e.g. non fast-forward)
    Rejected,
    /// A new branch was created locally
    NewHead,
    /// The ref moved forward
    FastForward,
    /// The ref was rewritten
    ForcedUpdate,
    /// Nothing changed
    HeadUptodate,
    /// A new tag was fetched
    NewTag,
    /// An existing tag moved
    TagUpdate,
}

impl FetchFlag {
    /// Upper-case name used in reports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Rejected => "REJECTED",
            Self::NewHead => "NEW_HEAD",
            Self::FastForward => "FAST_FORWARD",
            Self::ForcedUpdate => "FORCED_UPDATE",
            Self::HeadUptodate => "HEAD_UPTODATE",
            Self::NewTag => "NEW_TAG",
            Self::TagUpdate => "TAG_UPDATE",
        }
    }
}

impl fmt::Display for FetchFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed ref line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchInfo {
    /// Flags in canonical order
    pub flags: Vec<FetchFlag>,
    /// The summary column (`[up to date]`, `4f2a1c0..9be3d11`, ...)
    pub summary: String,
    /// The local ref name after `->`
    pub local_ref: String,
}

impl FetchInfo {
    /// Parse a single summary line; `None` for anything that is not one.
    #[must_use]
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut chars = line.chars();
        if chars.next()? != ' ' {
            return None;
        }
        let control = chars.next()?;
        let rest = chars.as_str().trim_start();
        let (left, right) = rest.split_once(" -> ")?;

        let summary = if left.starts_with('[') {
            left.split_once(']').map(|(s, _)| format!("{s}]"))?
        } else {
            left.split_whitespace().next()?.to_string()
        };
        let local_ref = right.split_whitespace().next()?.to_string();
        let note = right.trim();

        let mut flags = Vec::new();
        match control {
            '!' => flags.push(FetchFlag::Error),
            '+' => flags.push(FetchFlag::ForcedUpdate),
            '=' => flags.push(FetchFlag::HeadUptodate),
            ' ' => flags.push(FetchFlag::FastForward),
            't' => flags.push(FetchFlag::TagUpdate),
            '-' | '*' => {}
            _ => return None,
        }
        if summary.contains("rejected") || note.contains("rejected") {
            flags.push(FetchFlag::Rejected);
        }
        if summary.contains("new tag") {
            flags.push(FetchFlag::NewTag);
        }
        if summary.contains("tag update") && control != 't' {
            flags.push(FetchFlag::TagUpdate);
        }
        if summary.contains("new branch") || summary.contains("new ref") {
            flags.push(FetchFlag::NewHead);
        }
        flags.sort();
        flags.dedup();

        Some(Self {
            flags,
            summary,
            local_ref,
        })
    }

    /// All ref lines found in a command's output.
    #[must_use]
    pub fn parse_all(output: &str) -> Vec<Self> {
        output.lines().filter_map(Self::parse_line).collect()
    }

    /// Flag names worth reporting; empty when the ref was unchanged.
    #[must_use]
    pub fn reportable_flags(&self) -> Vec<String> {
        if self.flags.is_empty() || self.flags == [FetchFlag::HeadUptodate] {
            return Vec::new();
        }
        self.flags.iter().map(ToString::to_string).collect()
    }
}
