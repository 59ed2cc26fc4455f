//! Turning errors into terminal output and report findings.

use super::error::{BulkError, ErrorContext};

/// Format a per-repository failure as `"<kind>: <message>"`.
///
/// The kind is taken from the first [`BulkError`] found in the error chain.
/// IO errors keep their own kind; anything else is an `OperationError`.
#[must_use]
pub fn describe_failure(error: &anyhow::Error) -> String {
    if let Some(bulk_error) = error.chain().find_map(|e| e.downcast_ref::<BulkError>()) {
        return format!("{}: {}", bulk_error.kind(), bulk_error.finding_message());
    }

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        return format!("IoError: {io_error}");
    }

    format!("OperationError: {error:#}")
}

/// Format the payload of a panicked task as an `OperationError` finding.
#[must_use]
pub fn describe_panic(payload: &(dyn std::any::Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "task panicked".to_string());
    format!("OperationError: {message}")
}

/// Convert any error into a user-friendly [`ErrorContext`] with suggestions.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let chain_details = {
        let causes: Vec<String> = error.chain().skip(1).map(ToString::to_string).collect();
        if causes.is_empty() {
            None
        } else {
            Some(causes.join(": "))
        }
    };

    let found = error.chain().find_map(|e| e.downcast_ref::<BulkError>()).map(clone_for_display);
    let Some(bulk_error) = found else {
        let ctx = ErrorContext::new(BulkError::operation(error.to_string()));
        return match chain_details {
            Some(details) => ctx.with_details(details),
            None => ctx,
        };
    };

    let ctx = create_error_context(bulk_error);
    match (chain_details, ctx.details.is_none()) {
        (Some(details), true) => ctx.with_details(details),
        _ => ctx,
    }
}

fn create_error_context(error: BulkError) -> ErrorContext {
    let (suggestion, details): (Option<&str>, Option<String>) = match &error {
        BulkError::ConfigurationError {
            message,
        } if message.contains("must be within a gitlab work-dir") => (
            Some("Run 'glbulk init <group-path> <dir>' to create a work-dir, or change into one"),
            None,
        ),
        BulkError::PathError {
            ..
        } => (Some("Use a group path below the work-dir's base group"), None),
        BulkError::NotFoundError {
            ..
        } => (Some("Check the path spelling and that your token can see it"), None),
        BulkError::GitNotFound => (
            Some("Install git from https://git-scm.com/ or your package manager"),
            Some("glbulk drives the system git executable".to_string()),
        ),
        BulkError::GitCommandError {
            operation,
            stderr,
        } => (
            Some("Ensure git is properly configured and try again"),
            Some(format!("git {operation}: {}", stderr.trim())),
        ),
        BulkError::GitLabApiError {
            status: 401 | 403,
            ..
        } => (Some("Check the private_token or oauth_token in the .gitlab file"), None),
        BulkError::NetworkError {
            ..
        } => (Some("Check the server url in the .gitlab file and your connection"), None),
        BulkError::TomlError(_) => (Some("Check the syntax of the configuration file"), None),
        _ => (None, None),
    };

    let mut ctx = ErrorContext::new(error);
    if let Some(suggestion) = suggestion {
        ctx = ctx.with_suggestion(suggestion);
    }
    if let Some(details) = details {
        ctx = ctx.with_details(details);
    }
    ctx
}

// The typed error sits behind a shared reference in the chain; rebuild an owned
// copy for display. Wrapped library errors are flattened to their message.
fn clone_for_display(error: &BulkError) -> BulkError {
    match error {
        BulkError::ConfigurationError {
            message,
        } => BulkError::configuration(message.clone()),
        BulkError::PathError {
            message,
        } => BulkError::path(message.clone()),
        BulkError::NotFoundError {
            message,
        } => BulkError::not_found(message.clone()),
        BulkError::RemoteAliasError {
            alias,
        } => BulkError::RemoteAliasError {
            alias: alias.clone(),
        },
        BulkError::OperationError {
            message,
        } => BulkError::operation(message.clone()),
        BulkError::GitCommandError {
            operation,
            stderr,
        } => BulkError::GitCommandError {
            operation: operation.clone(),
            stderr: stderr.clone(),
        },
        BulkError::GitCloneFailed {
            url,
            reason,
        } => BulkError::GitCloneFailed {
            url: url.clone(),
            reason: reason.clone(),
        },
        BulkError::GitNotFound => BulkError::GitNotFound,
        BulkError::GitLabApiError {
            status,
            message,
        } => BulkError::GitLabApiError {
            status: *status,
            message: message.clone(),
        },
        BulkError::NetworkError {
            operation,
            reason,
        } => BulkError::NetworkError {
            operation: operation.clone(),
            reason: reason.clone(),
        },
        BulkError::IoError(e) => BulkError::IoError(std::io::Error::new(e.kind(), e.to_string())),
        BulkError::TomlError(e) => BulkError::configuration(format!("TOML parsing error: {e}")),
        BulkError::TomlSerError(e) => {
            BulkError::configuration(format!("TOML serialization error: {e}"))
        }
    }
}
