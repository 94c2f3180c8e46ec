//! Command dispatch.
//!
//! A [`Dispatcher`] maps command names to handler functions, invokes exactly
//! one per invocation and turns handler failures into a failing
//! [`DispatchResult`] after reporting them on standard error.

mod error;
mod outcome;

use std::collections::BTreeMap;
use std::error::Error;
use std::io::Write;
use std::path::PathBuf;

use clap::CommandFactory;
use tcf_config::Config;
use tracing::debug;

pub use error::{CommandError, ResolveError};
pub use outcome::{DispatchResult, TransportResponse};

use crate::cli::{Cli, TcfCommand};
use crate::session::Session;

/// Tracing target for dispatch events.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");

/// Signature shared by every command handler.
pub type Handler =
    fn(&TcfCommand, &mut CommandContext<'_>) -> Result<DispatchResult, CommandError>;

/// What a handler may touch while it runs.
pub struct CommandContext<'a> {
    pub config: &'a Config,
    /// Configuration files that were discovered for this invocation.
    pub config_files: &'a [PathBuf],
    pub session: &'a mut Session,
    pub stdout: &'a mut dyn Write,
    pub stderr: &'a mut dyn Write,
}

/// Registry of command handlers.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    handlers: BTreeMap<&'static str, Handler>,
    traces: bool,
}

impl Dispatcher {
    /// Creates an empty registry. `traces` selects detailed failure reports.
    #[must_use]
    pub fn new(traces: bool) -> Self {
        Self {
            handlers: BTreeMap::new(),
            traces,
        }
    }

    /// Registers `handler` under `name`, returning any handler it replaces.
    pub fn register(&mut self, name: &'static str, handler: Handler) -> Option<Handler> {
        self.handlers.insert(name, handler)
    }

    /// Registered command names in order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.handlers.keys().copied()
    }

    /// Runs the handler for `command` and returns its result.
    ///
    /// Never fails: missing commands, unknown names and handler errors are
    /// reported on `context.stderr` and yield [`DispatchResult::failure`].
    pub fn dispatch(
        &self,
        command: Option<&TcfCommand>,
        context: &mut CommandContext<'_>,
    ) -> DispatchResult {
        let Some(command) = command else {
            let usage = Cli::command().render_help();
            let _ = write!(context.stderr, "{usage}");
            return DispatchResult::failure();
        };

        let name = command.name();
        let Some(handler) = self.handlers.get(name) else {
            let _ = writeln!(context.stderr, "error: {name}: no handler for command");
            return DispatchResult::failure();
        };

        debug!(target: DISPATCH_TARGET, command = name, "dispatching");
        match handler(command, context) {
            Ok(result) => {
                debug!(
                    target: DISPATCH_TARGET,
                    command = name,
                    shape = result.shape(),
                    "command finished"
                );
                result
            }
            Err(error) => {
                debug!(target: DISPATCH_TARGET, command = name, %error, "command failed");
                for line in describe_failure(name, error.kind(), &error, self.traces) {
                    let _ = writeln!(context.stderr, "{line}");
                }
                DispatchResult::failure()
            }
        }
    }
}

/// Renders a handler failure as report lines.
///
/// The first line is always the description; with `traces` it is followed by
/// the origin and one `caused by:` line per source in the chain.
pub(crate) fn describe_failure(
    command: &str,
    kind: &str,
    error: &dyn Error,
    traces: bool,
) -> Vec<String> {
    let description = error.to_string();
    let mut lines = vec![if description.trim().is_empty() {
        format!("error: {kind} failed with no description")
    } else {
        format!("error: {description}")
    }];
    if traces {
        lines.push(format!("  origin: command '{command}' ({kind})"));
        let mut cause = error.source();
        while let Some(inner) = cause {
            lines.push(format!("  caused by: {inner}"));
            cause = inner.source();
        }
    }
    lines
}
