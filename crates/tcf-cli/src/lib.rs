//! Command-line runtime for the `tcf` test-target client.
//!
//! An invocation runs through a fixed pipeline: parse the arguments, load
//! configuration, inject `-e` assignments into the environment, initialise
//! telemetry, open the broker session, settle jobserver delegation for
//! `run`, dispatch the command, normalise its result into an exit status and
//! close the session. The runtime can be driven from the binary or from
//! tests with substituted configuration, output streams and process
//! replacement.

use std::env;
use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::Parser;
use clap::error::ErrorKind;
use tcf_config::{Config, discover_config_files};
use tracing::warn;

mod cli;
mod commands;
mod config;
mod dispatch;
mod environment;
mod errors;
mod jobserver;
mod quoting;
mod session;
mod telemetry;

use cli::{Cli, TcfCommand};
use commands::register_builtin;
use config::{ConfigArgumentSplit, prepare_cli_arguments, split_config_arguments};
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
use dispatch::{CommandContext, Dispatcher};
use errors::AppError;
use jobserver::{
    Coordination, ExecReplacer, HandoffLease, HandoffToken, JobserverController, ProcessReplacer,
    Relaunch,
};
use session::{CachedInventory, Session};

const RUNTIME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runtime");

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, W: Write, E: Write> {
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, W: Write, E: Write> IoStreams<'a, W, E> {
    pub(crate) fn new(stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self { stdout, stderr }
    }
}

struct CliRunner<'a, W: Write, E: Write, L: ConfigLoader, R: ProcessReplacer> {
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
    replacer: R,
}

impl<'a, W, E, L, R> CliRunner<'a, W, E, L, R>
where
    W: Write,
    E: Write,
    L: ConfigLoader,
    R: ProcessReplacer,
{
    fn new(io: &'a mut IoStreams<'a, W, E>, loader: &'a L, replacer: R) -> Self {
        Self {
            io,
            loader,
            replacer,
        }
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        match self.execute(&args) {
            Ok(status) => exit_code_from_status(status),
            Err(AppError::CliUsage(error))
                if matches!(error.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) =>
            {
                let _ = write!(self.io.stdout, "{error}");
                let _ = self.io.stdout.flush();
                ExitCode::SUCCESS
            }
            Err(AppError::CliUsage(error)) => {
                let _ = write!(self.io.stderr, "{error}");
                ExitCode::FAILURE
            }
            Err(error) => {
                let _ = writeln!(self.io.stderr, "error: {error}");
                ExitCode::FAILURE
            }
        }
    }

    fn execute(&mut self, args: &[OsString]) -> Result<i64, AppError> {
        let split = split_config_arguments(args);
        let cli = Cli::try_parse_from(prepare_cli_arguments(args, &split))
            .map_err(AppError::CliUsage)?;
        let config = self.loader.load(&split.config_arguments)?;
        environment::inject(&cli.environment)?;
        telemetry::initialise(&config, cli.debug)?;

        let mut session = Session::open(&config, &CachedInventory::new(config.state_paths()));
        let lease = match &cli.command {
            Some(TcfCommand::Run(_)) => self.coordinate_jobserver(&cli, &config, args, &split)?,
            _ => None,
        };

        let config_files = discover_config_files(&split.config_arguments);
        let mut dispatcher = Dispatcher::new(cli.traces);
        register_builtin(&mut dispatcher);
        let result = {
            let mut context = CommandContext {
                config: &config,
                config_files: &config_files,
                session: &mut session,
                stdout: &mut *self.io.stdout,
                stderr: &mut *self.io.stderr,
            };
            dispatcher.dispatch(cli.command.as_ref(), &mut context)
        };
        let status = result.exit_status();

        drop(lease);
        if let Err(error) = session.close() {
            warn!(target: RUNTIME_TARGET, %error, "failed to persist session state");
        }
        let _ = self.io.stdout.flush();
        Ok(status)
    }

    /// Settles jobserver delegation for `run`.
    ///
    /// Only returns when the command should run in this process; when this
    /// process is replaced by make it never returns at all.
    fn coordinate_jobserver(
        &mut self,
        cli: &Cli,
        config: &Config,
        args: &[OsString],
        split: &ConfigArgumentSplit,
    ) -> Result<Option<HandoffLease>, AppError> {
        let token = HandoffToken::from_flags(cli.make_jobserver.as_deref(), cli.no_make_jobserver);
        let relaunch = Relaunch::new(
            args.first().cloned().unwrap_or_default(),
            split.config_arguments.get(1..).unwrap_or_default().to_vec(),
            args.get(split.command_start..).unwrap_or_default().to_vec(),
        );
        // Anything already written must reach the terminal before exec.
        let _ = self.io.stdout.flush();
        let _ = self.io.stderr.flush();

        let mut controller = JobserverController::new(config, env::temp_dir(), &mut self.replacer);
        match controller.coordinate(&token, &relaunch)? {
            Coordination::Direct => Ok(None),
            Coordination::Delegated(lease) => Ok(Some(lease)),
        }
    }
}

/// Runs the CLI using the provided arguments and IO handles.
#[must_use]
pub fn run<I, W, E>(args: I, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
#[must_use]
pub(crate) fn run_with_loader<'a, I, W, E, L>(
    args: I,
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader, ExecReplacer).run(args)
}

/// Runs the CLI with a custom configuration loader and process replacer.
#[cfg(test)]
pub(crate) fn run_with_replacer<'a, I, W, E, L, R>(
    args: I,
    io: &'a mut IoStreams<'a, W, E>,
    loader: &'a L,
    replacer: R,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
    L: ConfigLoader,
    R: ProcessReplacer,
{
    CliRunner::new(io, loader, replacer).run(args)
}

fn exit_code_from_status(status: i64) -> ExitCode {
    u8::try_from(status).map_or(ExitCode::FAILURE, ExitCode::from)
}
