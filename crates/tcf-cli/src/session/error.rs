//! Failures while loading or persisting per-broker session state.

use std::io;
use std::path::PathBuf;

use tcf_config::StatePathsError;
use thiserror::Error;

/// Failures while loading or persisting broker session state.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    StateDirectory(#[from] StatePathsError),
    #[error("failed to read target inventory {path:?}: {source}")]
    ReadInventory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse target inventory {path:?}: {source}")]
    ParseInventory {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialise cookies for {server}: {source}")]
    SerialiseCookies {
        server: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write cookies to {path:?}: {source}")]
    WriteCookies {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to remove cookies file {path:?}: {source}")]
    RemoveCookies {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
