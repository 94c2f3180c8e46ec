//! Error types for jobserver handoff.

use std::ffi::OsString;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while delegating to make. All of them are fatal: running
/// without the jobserver would lift the parallelism bound.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("failed to create jobserver handoff file in {dir:?}: {source}")]
    CreateHandoff {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write jobserver handoff file {path:?}: {source}")]
    WriteHandoff {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to keep jobserver handoff file {path:?}: {source}")]
    KeepHandoff {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot embed non UTF-8 argument {argument:?} in a make recipe")]
    NonUtf8Argument { argument: OsString },
    #[error("failed to re-execute under '{program}': {source}")]
    Replace {
        program: String,
        #[source]
        source: io::Error,
    },
}
