//! Shared configuration for the `tcf` command-line client.
//!
//! Configuration is layered by `ortho_config`: defaults, then discovered
//! TOML files (`tcf.toml` under the XDG configuration directory, `.tcf.toml`
//! in the home and project directories, `TCF_CONFIG_PATH`, `--config-path`),
//! then `TCF_*` environment variables, then command-line flags.

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod discovery;
mod logging;
mod paths;
mod server;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_MAKE_PROGRAM, DEFAULT_SHARE_DIR, default_log_filter,
    default_log_filter_string, default_log_format, default_make_jobs, default_make_program,
    default_share_dir, default_state_dir,
};
pub use discovery::{
    CONFIG_FILE_NAME, CONFIG_PATH_ENV, CONFIG_PATH_FLAG, DOTFILE_NAME, discover_config_files,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use paths::{StatePaths, StatePathsError};
pub use server::{DEFAULT_BROKER_PORT, ServerParseError, ServerSpec};

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(
    prefix = "TCF",
    discovery(
        app_name = "tcf",
        env_var = "TCF_CONFIG_PATH",
        config_file_name = "tcf.toml",
        dotfile_name = ".tcf.toml",
        project_file_name = ".tcf.toml",
        config_cli_long = "config-path",
        config_cli_visible = true,
    )
)]
pub struct Config {
    /// Directory for persisted client state (cookies, cached inventories).
    #[ortho_config(default = default_state_dir())]
    pub state_dir: Utf8PathBuf,
    /// Directory holding packaged, read-only data.
    #[ortho_config(default = default_share_dir())]
    pub share_dir: Utf8PathBuf,
    /// Target brokers this client talks to.
    #[serde(default)]
    pub servers: Vec<ServerSpec>,
    /// `tracing` filter expression.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Concurrency tokens make hands out when `run` delegates to it.
    #[ortho_config(default = default_make_jobs())]
    pub make_jobs: u32,
    /// Program hosting the jobserver.
    #[ortho_config(default = default_make_program())]
    pub make_program: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            share_dir: default_share_dir(),
            servers: Vec::new(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            make_jobs: default_make_jobs(),
            make_program: default_make_program(),
        }
    }
}

impl Config {
    /// Directory for persisted client state.
    #[must_use]
    pub fn state_dir(&self) -> &Utf8PathBuf {
        &self.state_dir
    }

    /// Directory holding packaged data.
    #[must_use]
    pub fn share_dir(&self) -> &Utf8PathBuf {
        &self.share_dir
    }

    /// Configured brokers.
    #[must_use]
    pub fn servers(&self) -> &[ServerSpec] {
        &self.servers
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Jobserver parallelism; never below one.
    #[must_use]
    pub fn make_jobs(&self) -> u32 {
        self.make_jobs.max(1)
    }

    /// Program hosting the jobserver.
    #[must_use]
    pub fn make_program(&self) -> &str {
        &self.make_program
    }

    /// State paths derived from [`Config::state_dir`].
    #[must_use]
    pub fn state_paths(&self) -> StatePaths {
        StatePaths::from_config(self)
    }
}
