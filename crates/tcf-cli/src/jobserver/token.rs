//! The handoff token carried across the re-exec boundary.

use std::path::PathBuf;

/// Coordination state decided from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffToken {
    /// No decision yet: this is the operator's own invocation.
    Unset,
    /// `--no-make-jobserver`: never delegate.
    Disabled,
    /// `--make-jobserver=PATH`: running under make; `PATH` is the handoff
    /// makefile to remove once the command completes.
    Handoff(PathBuf),
}

impl HandoffToken {
    /// Derives the token from the parsed global flags.
    ///
    /// An empty `--make-jobserver=` value counts as unset.
    #[must_use]
    pub fn from_flags(make_jobserver: Option<&str>, no_make_jobserver: bool) -> Self {
        if no_make_jobserver {
            return Self::Disabled;
        }
        match make_jobserver {
            Some(path) if !path.is_empty() => Self::Handoff(PathBuf::from(path)),
            _ => Self::Unset,
        }
    }
}
