//! Derives the client state paths shared by every command.
//!
//! The state directory houses per-broker cookie jars and cached target
//! inventories. Everything that reads or writes those files goes through
//! [`StatePaths`] so the naming stays in one place.

use std::fs::DirBuilder;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::{Config, ServerSpec};

/// Canonical paths for persisted client state.
#[derive(Debug, Clone)]
pub struct StatePaths {
    state_dir: PathBuf,
}

impl StatePaths {
    /// Derives state paths from the shared configuration without touching
    /// the filesystem.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.state_dir().as_std_path())
    }

    /// Uses `state_dir` as the state directory.
    #[must_use]
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
        }
    }

    /// Directory holding client state.
    #[must_use]
    pub fn state_dir(&self) -> &Path {
        self.state_dir.as_path()
    }

    /// Cookie jar persisted for `server`.
    #[must_use]
    pub fn cookies_path(&self, server: &ServerSpec) -> PathBuf {
        self.state_dir
            .join(format!("cookies-{}.json", server.url_safe()))
    }

    /// Cached target inventory for `server`.
    #[must_use]
    pub fn inventory_path(&self, server: &ServerSpec) -> PathBuf {
        self.state_dir
            .join(format!("targets-{}.json", server.url_safe()))
    }

    /// Creates the state directory (mode 0700 on Unix) when missing.
    pub fn ensure_state_dir(&self) -> Result<(), StatePathsError> {
        let mut builder = DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        if let Err(source) = builder.create(&self.state_dir)
            && source.kind() != io::ErrorKind::AlreadyExists
        {
            return Err(StatePathsError::StateDirectory {
                path: self.state_dir.clone(),
                source,
            });
        }
        Ok(())
    }
}

/// Errors raised while preparing state paths.
#[derive(Debug, Error)]
pub enum StatePathsError {
    /// Creating the state directory failed.
    #[error("failed to prepare state directory '{path}': {source}", path = .path.display())]
    StateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
