//! Configuration loading helpers for the `tcf` CLI.
//!
//! Leading configuration flags are split off the argument vector and handed
//! to `ortho_config`; the runtime parses the remaining command tokens.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use tcf_config::Config;

use crate::errors::AppError;

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: keep in sync with the fields of `tcf_config::Config`.
pub(crate) const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--state-dir",
    "--share-dir",
    "--servers",
    "--log-filter",
    "--log-format",
    "--make-jobs",
    "--make-program",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration for the CLI.
    ///
    /// # Flag Ordering
    ///
    /// Configuration flags (listed in `CONFIG_CLI_FLAGS`) must appear before
    /// the command. Flags after it belong to the command.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

#[derive(Debug, Clone, Copy)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

impl OrthoConfigLoader {
    fn process_config_flag(argument: &OsStr) -> FlagAction {
        let argument_text = argument.to_string_lossy();
        if !argument_text.starts_with("--") {
            return FlagAction::Skip;
        }

        let (flag, has_inline_value) = match argument_text.split_once('=') {
            Some((flag, _)) => (flag, true),
            None => (&*argument_text, false),
        };

        if CONFIG_CLI_FLAGS.contains(&flag) {
            return FlagAction::Include {
                needs_value: !has_inline_value,
            };
        }

        FlagAction::Skip
    }
}

pub(crate) struct ConfigArgumentSplit {
    /// `argv[0]` followed by the configuration flags and their values.
    pub(crate) config_arguments: Vec<OsString>,
    /// Index of the first token that is not configuration.
    pub(crate) command_start: usize,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some(program) = args.first() else {
        return ConfigArgumentSplit {
            config_arguments: Vec::new(),
            command_start: 0,
        };
    };

    let mut filtered: Vec<OsString> = vec![program.clone()];
    let mut command_start = 1usize;
    let mut pending_value = false;

    for argument in &args[1..] {
        if pending_value {
            filtered.push(argument.clone());
            pending_value = false;
            command_start += 1;
            continue;
        }

        match OrthoConfigLoader::process_config_flag(argument.as_os_str()) {
            FlagAction::Include { needs_value } => {
                filtered.push(argument.clone());
                command_start += 1;
                pending_value = needs_value;
            }
            FlagAction::Skip => break,
        }
    }

    ConfigArgumentSplit {
        config_arguments: filtered,
        command_start,
    }
}

/// Arguments for clap: `argv[0]` and everything from the command onwards.
pub(crate) fn prepare_cli_arguments(
    args: &[OsString],
    split: &ConfigArgumentSplit,
) -> Vec<OsString> {
    let mut cli_arguments: Vec<OsString> = Vec::new();
    if let Some(first) = args.first() {
        cli_arguments.push(first.clone());
    }
    if let Some(rest) = args.get(split.command_start..) {
        cli_arguments.extend(rest.iter().cloned());
    }
    cli_arguments
}
