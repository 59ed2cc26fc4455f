//! Error handling for glbulk
//!
//! Two layers are used, mirroring how the rest of the crate reports failures:
//!
//! - [`BulkError`] is the strongly-typed taxonomy. Resolution-phase failures
//!   (no work-dir, a path outside the work-dir, an unknown group) abort a
//!   command; failures inside one repository of a batch are turned into a
//!   finding string by [`describe_failure`](super::describe_failure).
//! - [`ErrorContext`] wraps a [`BulkError`] with details and a suggestion for
//!   display on the terminal.
//!
//! Module boundaries return [`anyhow::Result`] and attach context with
//! `.context()`; the typed error is recovered by walking the chain.

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The error taxonomy of glbulk.
///
/// The first five variants are the domain errors every command can surface.
/// The remaining ones wrap the collaborators (git, the GitLab API, the file
/// system, TOML) so their failures keep a recognizable kind when they are
/// reported as per-repository findings.
#[derive(Error, Debug)]
pub enum BulkError {
    /// The work-dir is missing or its configuration is unusable, or a local
    /// directory does not exist.
    #[error("{message}")]
    ConfigurationError {
        /// Human readable description
        message: String,
    },

    /// A group path or local path lies outside the current work-dir.
    #[error("{message}")]
    PathError {
        /// Human readable description naming the offending path
        message: String,
    },

    /// A group or project lookup on the GitLab server found nothing.
    #[error("{message}")]
    NotFoundError {
        /// Human readable description naming the missing entity
        message: String,
    },

    /// A repository lacks the remote alias an operation needs.
    #[error("Remote alias '{alias}' is not set.")]
    RemoteAliasError {
        /// The alias that was looked up
        alias: String,
    },

    /// Catch-all for unexpected failures inside a per-repository operation.
    #[error("{message}")]
    OperationError {
        /// Human readable description
        message: String,
    },

    /// A git command exited with a non-zero status.
    #[error("Git operation failed: {operation}")]
    GitCommandError {
        /// The git sub-command that failed (e.g. "fetch", "pull")
        operation: String,
        /// Captured standard error of the command
        stderr: String,
    },

    /// `git clone` failed.
    #[error("Failed to clone repository: {url}")]
    GitCloneFailed {
        /// The URL that was cloned
        url: String,
        /// Captured standard error of the command
        reason: String,
    },

    /// The git executable is not on the PATH.
    #[error("Git is not installed or not found in PATH")]
    GitNotFound,

    /// The GitLab API answered with an unexpected HTTP status.
    #[error("GitLab API request failed with status {status}: {message}")]
    GitLabApiError {
        /// HTTP status code
        status: u16,
        /// Response body or a short description
        message: String,
    },

    /// The GitLab API could not be reached.
    #[error("Network error during {operation}: {reason}")]
    NetworkError {
        /// What was being requested
        operation: String,
        /// Transport level reason
        reason: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),
}

impl BulkError {
    /// Shorthand for a [`BulkError::ConfigurationError`].
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError {
            message: message.into(),
        }
    }

    /// Shorthand for a [`BulkError::PathError`].
    pub fn path(message: impl Into<String>) -> Self {
        Self::PathError {
            message: message.into(),
        }
    }

    /// Shorthand for a [`BulkError::NotFoundError`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFoundError {
            message: message.into(),
        }
    }

    /// Shorthand for a [`BulkError::OperationError`].
    pub fn operation(message: impl Into<String>) -> Self {
        Self::OperationError {
            message: message.into(),
        }
    }

    /// The variant name, used as the `<kind>` prefix of findings.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ConfigurationError {
                ..
            } => "ConfigurationError",
            Self::PathError {
                ..
            } => "PathError",
            Self::NotFoundError {
                ..
            } => "NotFoundError",
            Self::RemoteAliasError {
                ..
            } => "RemoteAliasError",
            Self::OperationError {
                ..
            } => "OperationError",
            Self::GitCommandError {
                ..
            } => "GitCommandError",
            Self::GitCloneFailed {
                ..
            } => "GitCloneFailed",
            Self::GitNotFound => "GitNotFound",
            Self::GitLabApiError {
                ..
            } => "GitLabApiError",
            Self::NetworkError {
                ..
            } => "NetworkError",
            Self::IoError(_) => "IoError",
            Self::TomlError(_) => "TomlError",
            Self::TomlSerError(_) => "TomlSerError",
        }
    }

    /// One-line message for a finding.
    ///
    /// Git failures report the first meaningful line git printed instead of
    /// the generic "operation failed" text.
    #[must_use]
    pub fn finding_message(&self) -> String {
        match self {
            Self::GitCommandError {
                stderr,
                ..
            }
            | Self::GitCloneFailed {
                reason: stderr,
                ..
            } => first_meaningful_line(stderr).unwrap_or_else(|| self.to_string()),
            _ => self.to_string(),
        }
    }

    /// Whether a retry may succeed (server-side or transport failures).
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::NetworkError {
                ..
            } => true,
            Self::GitLabApiError {
                status,
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

fn first_meaningful_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("Cloning into"))
        .map(ToString::to_string)
}

/// A [`BulkError`] decorated for the terminal.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: BulkError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context without suggestion or details.
    #[must_use]
    pub const fn new(error: BulkError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion, printed in green.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details, printed in yellow.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_alias_message() {
        let error = BulkError::RemoteAliasError {
            alias: "upstream".to_string(),
        };
        assert_eq!(error.to_string(), "Remote alias 'upstream' is not set.");
        assert_eq!(error.kind(), "RemoteAliasError");
    }

    #[test]
    fn test_git_finding_uses_first_stderr_line() {
        let error = BulkError::GitCloneFailed {
            url: "https://gitlab.example.com/team/a.git".to_string(),
            reason: "Cloning into 'a'...\nfatal: repository not found\nmore".to_string(),
        };
        assert_eq!(error.finding_message(), "fatal: repository not found");

        let empty = BulkError::GitCommandError {
            operation: "fetch".to_string(),
            stderr: String::new(),
        };
        assert_eq!(empty.finding_message(), "Git operation failed: fetch");
    }

    #[test]
    fn test_transient_classification() {
        let server = BulkError::GitLabApiError {
            status: 502,
            message: "bad gateway".to_string(),
        };
        let client = BulkError::GitLabApiError {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert!(server.is_transient());
        assert!(!client.is_transient());
        assert!(!BulkError::not_found("Group 'x' does not exist.").is_transient());
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(BulkError::GitNotFound)
            .with_details("git is required")
            .with_suggestion("Install git");
        let rendered = ctx.to_string();
        assert!(rendered.contains("Git is not installed"));
        assert!(rendered.contains("Details: git is required"));
        assert!(rendered.contains("Suggestion: Install git"));
    }
}
