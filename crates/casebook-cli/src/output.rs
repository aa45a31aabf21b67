//! Shared output layer for human/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`]. Results go to stdout,
//! errors to stderr; in JSON mode both are single JSON documents.

use casebook_core::{CaseError, ErrorCode};
use serde::Serialize;
use std::fmt;
use std::io::{self, Write};

/// Shared width for human separators.
pub const RULE_WIDTH: usize = 72;

pub fn rule(w: &mut dyn Write) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "", width = RULE_WIDTH)
}

/// Write a section heading followed by a separator.
pub fn section(w: &mut dyn Write, heading: &str) -> io::Result<()> {
    writeln!(w, "{heading}")?;
    rule(w)
}

/// Render a left-aligned key/value line in human output.
pub fn kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:<14} {}", format!("{key}:"), value.as_ref())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// A CLI-level failure carrying a machine code, for conditions the core
/// never reports itself (missing store, missing identity, bad config).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandError {
    pub message: String,
    pub code: ErrorCode,
}

impl CommandError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }
}

impl From<ErrorCode> for CommandError {
    /// A failure described by the code's own summary.
    fn from(code: ErrorCode) -> Self {
        Self::new(code, code.message())
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CommandError {}

/// A structured error with optional suggestion and error code.
///
/// `status` is the transport equivalent (404, 403, 400, or 500); the
/// process exit code is derived from it.
#[derive(Debug, Serialize)]
pub struct CliError {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    pub status: u16,
}

impl CliError {
    fn coded(message: String, code: ErrorCode) -> Self {
        let message = if message.trim().is_empty() {
            code.message().to_string()
        } else {
            message
        };
        Self {
            message,
            suggestion: code.hint().map(str::to_string),
            error_code: Some(code.code().to_string()),
            status: code.transport_status(),
        }
    }

    /// Exit code: 4 not found, 3 forbidden, 2 invalid input, 1 otherwise.
    pub const fn exit_code(&self) -> u8 {
        match self.status {
            404 => 4,
            403 => 3,
            400 => 2,
            _ => 1,
        }
    }
}

impl From<&CaseError> for CliError {
    fn from(err: &CaseError) -> Self {
        Self::coded(err.to_string(), err.code())
    }
}

impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        if let Some(case_err) = err.downcast_ref::<CaseError>() {
            return Self::from(case_err);
        }
        if let Some(command_err) = err.downcast_ref::<CommandError>() {
            return Self::coded(command_err.message.clone(), command_err.code);
        }
        Self {
            message: format!("{err:#}"),
            suggestion: None,
            error_code: None,
            status: 500,
        }
    }
}

/// Render a serializable value to stdout: JSON as-is, otherwise through
/// `human_fn`.
pub fn render<T: Serialize + ?Sized>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if mode.is_json() {
        serde_json::to_writer_pretty(&mut out, value)?;
        writeln!(out)?;
    } else {
        human_fn(value, &mut out)?;
    }
    Ok(())
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => {
            match &error.error_code {
                Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}

/// Render a one-line success message to stdout.
pub fn render_success(mode: OutputMode, message: &str) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "ok": true,
                "message": message,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Human => writeln!(out, "✓ {message}")?,
    }
    Ok(())
}
