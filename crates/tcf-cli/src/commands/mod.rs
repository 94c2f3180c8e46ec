//! Built-in command handlers.

mod config;
mod cookies;
mod render;
mod run;
mod servers;

use crate::cli::TcfCommand;
use crate::dispatch::{CommandError, Dispatcher};

pub(crate) const COMMANDS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::commands");

/// Registers every built-in command with `dispatcher`.
pub fn register_builtin(dispatcher: &mut Dispatcher) {
    dispatcher.register("run", run::run);
    dispatcher.register("cookies", cookies::cookies);
    dispatcher.register("config", config::config);
    dispatcher.register("servers", servers::servers);
    dispatcher.register("logout", servers::logout);
}

fn mismatched(expected: &'static str, command: &TcfCommand) -> CommandError {
    CommandError::Mismatched {
        expected,
        found: command.name(),
    }
}
