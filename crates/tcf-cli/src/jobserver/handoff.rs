//! Handoff makefile generation.
//!
//! The handoff file holds a single phony rule whose recipe re-invokes the
//! original command line with `--make-jobserver=<own path>` inserted after
//! the leading configuration flags. The recipe is prefixed with `+` so make
//! treats it as a sub-make and passes its jobserver down, and with `@` so
//! make does not echo it.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use tempfile::Builder;

use super::error::HandoffError;
use crate::cli::Cli;
use crate::quoting::quote_for_recipe;

/// Name of the single rule in the handoff makefile.
pub const JOBSERVER_TARGET: &str = "tcf-jobserver-run";
/// Flag carrying the handoff path into the re-executed process.
pub const HANDOFF_FLAG: &str = "--make-jobserver";

const HANDOFF_PREFIX: &str = "tcf-jobserver-";
const HANDOFF_SUFFIX: &str = ".mk";

/// The original command line, split where the handoff flag is inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relaunch {
    program: OsString,
    config_arguments: Vec<OsString>,
    command_arguments: Vec<OsString>,
}

impl Relaunch {
    /// `program` is `argv[0]`; `config_arguments` are the leading
    /// configuration flags (without `argv[0]`); `command_arguments` is
    /// everything after them.
    ///
    /// Empty handoff flags among the global flags are dropped so the
    /// relaunched command line carries exactly one. Arguments from the
    /// subcommand onwards are kept verbatim.
    #[must_use]
    pub fn new(
        program: OsString,
        config_arguments: Vec<OsString>,
        mut command_arguments: Vec<OsString>,
    ) -> Self {
        let subcommand = command_arguments
            .iter()
            .position(|argument| is_subcommand(argument))
            .unwrap_or(command_arguments.len());
        let payload = command_arguments.split_off(subcommand);
        let empty_marker = format!("{HANDOFF_FLAG}=");
        command_arguments
            .retain(|argument| argument != HANDOFF_FLAG && argument != empty_marker.as_str());
        command_arguments.extend(payload);
        Self {
            program,
            config_arguments,
            command_arguments,
        }
    }

    /// Command line for the re-executed process, handoff flag included.
    pub fn command_line(&self, handoff: &Path) -> Result<Vec<String>, HandoffError> {
        let mut marker = OsString::from(format!("{HANDOFF_FLAG}="));
        marker.push(handoff.as_os_str());

        std::iter::once(&self.program)
            .chain(&self.config_arguments)
            .chain(std::iter::once(&marker))
            .chain(&self.command_arguments)
            .map(|argument| {
                argument
                    .to_str()
                    .map(str::to_owned)
                    .ok_or_else(|| HandoffError::NonUtf8Argument {
                        argument: argument.clone(),
                    })
            })
            .collect()
    }
}

fn is_subcommand(argument: &OsStr) -> bool {
    let Some(argument) = argument.to_str() else {
        return false;
    };
    Cli::command().get_subcommands().any(|command| {
        command.get_name() == argument || command.get_all_aliases().any(|alias| alias == argument)
    })
}

/// Renders the makefile text for `relaunch`, naming `handoff` as its own
/// path.
pub fn render_makefile(relaunch: &Relaunch, handoff: &Path) -> Result<String, HandoffError> {
    let recipe = quote_for_recipe(relaunch.command_line(handoff)?);
    Ok(format!(
        "# Generated by tcf; removed by the command it runs.\n\
         .PHONY: {JOBSERVER_TARGET}\n\
         {JOBSERVER_TARGET}:\n\
         \t+@{recipe}\n"
    ))
}

/// Creates a uniquely named handoff file in `dir` and writes the recipe for
/// `relaunch` into it.
///
/// The contents are flushed and synced before returning so the re-executed
/// process always reads a complete file.
pub fn write_handoff_file(dir: &Path, relaunch: &Relaunch) -> Result<PathBuf, HandoffError> {
    let mut file = Builder::new()
        .prefix(HANDOFF_PREFIX)
        .suffix(HANDOFF_SUFFIX)
        .tempfile_in(dir)
        .map_err(|source| HandoffError::CreateHandoff {
            dir: dir.to_path_buf(),
            source,
        })?;
    let path = file.path().to_path_buf();

    // The temporary file removes itself if anything below fails.
    let contents = render_makefile(relaunch, &path)?;
    let write_error = |source: io::Error| HandoffError::WriteHandoff {
        path: path.clone(),
        source,
    };
    file.write_all(contents.as_bytes()).map_err(write_error)?;
    file.flush().map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;

    let (_, kept) = file.keep().map_err(|error| HandoffError::KeepHandoff {
        path: path.clone(),
        source: error.error,
    })?;
    Ok(kept)
}

/// Removes a handoff file, treating an already-missing file as success.
pub(crate) fn remove_handoff_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => Err(error),
        _ => Ok(()),
    }
}
