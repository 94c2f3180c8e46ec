use std::env;
use std::num::NonZeroUsize;
use std::thread;

use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Default log filter expression used by the CLI.
///
/// Warnings stay visible so unrecognised command results and cleanup failures
/// reach the operator without `--debug`.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Program invoked to host the jobserver when `run` delegates.
pub const DEFAULT_MAKE_PROGRAM: &str = "make";

/// Directory holding packaged data when nothing else is configured.
pub const DEFAULT_SHARE_DIR: &str = "/usr/share/tcf";

/// Default log filter expression used by the CLI.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the CLI.
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default make program name.
pub fn default_make_program() -> String {
    DEFAULT_MAKE_PROGRAM.to_owned()
}

/// Parallelism handed to make when none is configured: one token per CPU.
pub fn default_make_jobs() -> u32 {
    thread::available_parallelism()
        .map(NonZeroUsize::get)
        .ok()
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or(1)
}

/// Default share directory.
pub fn default_share_dir() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_SHARE_DIR)
}

/// Computes the default directory for persisted client state (cookies and
/// cached target inventories).
///
/// Prefers `$XDG_STATE_HOME/tcf`, then `~/.tcf`, then a directory under the
/// system temporary directory.
pub fn default_state_dir() -> Utf8PathBuf {
    if let Some(dir) = dirs::state_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok()) {
        return dir.join("tcf");
    }
    if let Some(home) = dirs::home_dir().and_then(|path| Utf8PathBuf::from_path_buf(path).ok()) {
        return home.join(".tcf");
    }
    let mut fallback = Utf8PathBuf::from_path_buf(env::temp_dir())
        .unwrap_or_else(|_| Utf8PathBuf::from("/tmp"));
    fallback.push("tcf-state");
    fallback
}
