//! Common utilities for CLI commands: output rendering and engine setup.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::CliConfig;
use crate::bulk::{BatchRunner, BulkOperations, Report};
use crate::constants::DEFAULT_MAX_PARALLEL;
use crate::core::BulkError;
use crate::gitlab::GitLabClient;
use crate::utils::{command_exists, get_git_command};
use crate::workdir::WorkdirContext;

/// How results are printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable, colored when writing to a terminal
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
    /// YAML
    Yaml,
}

/// Result of a command as far as the exit status is concerned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Nothing to report
    Clean,
    /// At least one finding was printed
    Findings,
}

impl CommandOutcome {
    /// Outcome of a printed findings report.
    #[must_use]
    pub fn of_report(report: &Report) -> Self {
        if report.is_empty() { Self::Clean } else { Self::Findings }
    }

    /// Process exit status.
    #[must_use]
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::Findings => 1,
        }
    }
}

/// Render any serializable value in `format`.
pub fn render<T: Serialize>(value: &T, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => {
            serde_json::to_string_pretty(value).context("Failed to render output as JSON")
        }
        OutputFormat::Yaml => {
            serde_yaml::to_string(value).context("Failed to render output as YAML")
        }
        OutputFormat::Text => {
            let value = serde_json::to_value(value).context("Failed to render output")?;
            let mut out = String::new();
            render_text(&value, &mut out);
            Ok(out)
        }
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "-".to_string(),
        other => other.to_string(),
    }
}

// Objects print as `key: value`, lists nested in objects as `  - item`,
// lists of objects as blocks separated by blank lines.
fn render_text(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                match value {
                    Value::Array(items) => {
                        out.push_str(&format!("{}:\n", key.bold()));
                        for item in items {
                            out.push_str(&format!("  - {}\n", scalar(item)));
                        }
                    }
                    other => out.push_str(&format!("{}: {}\n", key.bold(), scalar(other))),
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                if item.is_object() {
                    if index > 0 {
                        out.push('\n');
                    }
                    render_text(item, out);
                } else {
                    out.push_str(&scalar(item));
                    out.push('\n');
                }
            }
        }
        other => {
            out.push_str(&scalar(other));
            out.push('\n');
        }
    }
}

/// Print `value` to stdout.
pub fn print_output<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    let rendered = render(value, format)?;
    if format == OutputFormat::Text {
        print!("{rendered}");
    } else {
        println!("{}", rendered.trim_end());
    }
    Ok(())
}

/// Print a findings report and derive the exit outcome from it.
pub fn print_report(report: &Report, format: OutputFormat) -> Result<CommandOutcome> {
    print_output(report, format)?;
    Ok(CommandOutcome::of_report(report))
}

/// Discover the work-dir around the current directory and wire the engine to
/// its GitLab server.
pub async fn open_operations(config: &CliConfig) -> Result<BulkOperations> {
    if !command_exists(get_git_command()) {
        return Err(BulkError::GitNotFound.into());
    }
    let workdir = WorkdirContext::from_current_dir().await?;
    let client = GitLabClient::from_workdir(&workdir)?;
    let runner = BatchRunner::new(config.max_parallel.unwrap_or(DEFAULT_MAX_PARALLEL));
    Ok(BulkOperations::new(workdir, Arc::new(client), runner))
}
