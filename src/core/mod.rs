//! Core error types shared by every glbulk module.
//!
//! - [`BulkError`] is the typed error taxonomy.
//! - [`ErrorContext`] and [`user_friendly_error`] present errors on the terminal.
//! - [`describe_failure`] and [`describe_panic`] turn per-repository failures
//!   into report findings of the form `"<kind>: <message>"`.

pub mod error;
pub mod error_formatting;

pub use error::{BulkError, ErrorContext};
pub use error_formatting::{describe_failure, describe_panic, user_friendly_error};
