//! `-e/--environment KEY[=VALUE]` handling.
//!
//! Assignments are applied to the process environment before dispatch so
//! every collaborator, and anything make launches after a re-exec, sees them.

use thiserror::Error;
use tracing::debug;

/// Value given to a bare `KEY`.
pub(crate) const TRUTHY_VALUE: &str = "true";

const ENVIRONMENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::environment");

/// Errors raised while parsing environment assignments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvironmentError {
    /// The assignment had no variable name.
    #[error("invalid environment assignment '{0}': missing variable name")]
    MissingKey(String),
    /// The name or value cannot be stored in the environment.
    #[error("invalid environment assignment '{0}': names and values must not contain NUL")]
    InvalidCharacter(String),
}

/// Splits `KEY=VALUE` (or bare `KEY`) into its parts.
pub(crate) fn parse_assignment(raw: &str) -> Result<(String, String), EnvironmentError> {
    let (key, value) = raw.split_once('=').unwrap_or((raw, TRUTHY_VALUE));
    let key = key.trim();
    if key.is_empty() {
        return Err(EnvironmentError::MissingKey(raw.to_owned()));
    }
    if key.contains('\0') || value.contains('\0') {
        return Err(EnvironmentError::InvalidCharacter(raw.to_owned()));
    }
    Ok((key.to_owned(), value.to_owned()))
}

/// Validates every assignment, then applies them in order.
///
/// Nothing is applied if any assignment is malformed.
pub(crate) fn inject(assignments: &[String]) -> Result<(), EnvironmentError> {
    let parsed = assignments
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>, _>>()?;
    for (key, value) in parsed {
        debug!(target: ENVIRONMENT_TARGET, %key, %value, "setting environment variable");
        // SAFETY: called from the CLI entry point before any command runs and
        // before anything in this process spawns threads.
        unsafe { std::env::set_var(&key, &value) };
    }
    Ok(())
}
