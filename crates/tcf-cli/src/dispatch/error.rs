//! Failures reported by command handlers.

use std::io;

use thiserror::Error;

/// Lookup failures for targets and brokers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{target}: unknown target or server")]
    UnknownTarget { target: String },
    #[error("{target}: ambiguous target name, matches {}", .candidates.join(", "))]
    AmbiguousTarget {
        target: String,
        candidates: Vec<String>,
    },
    #[error("{server}: unknown server")]
    UnknownServer { server: String },
}

/// Errors a command handler may return to the dispatcher.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("failed to launch '{program}': {source}")]
    Launch {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to write command output: {0}")]
    Output(#[from] io::Error),
    #[error("failed to serialise command output: {0}")]
    Serialise(#[from] serde_json::Error),
    #[error("handler for '{expected}' cannot run '{found}'")]
    Mismatched {
        expected: &'static str,
        found: &'static str,
    },
}

impl CommandError {
    /// Short name of the failure class.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Resolve(_) => "resolve",
            Self::Launch { .. } => "launch",
            Self::Output(_) => "output",
            Self::Serialise(_) => "serialise",
            Self::Mismatched { .. } => "dispatch",
        }
    }
}
