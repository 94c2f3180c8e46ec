//! Command-line surface of `tcf`.
//!
//! Configuration flags (`--state-dir`, `--servers`, ...) are split off before
//! parsing and handed to the configuration loader; everything from the first
//! non-configuration token onwards is parsed here.

use std::ffi::OsString;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "tcf",
    version,
    about = "Front end for test-target brokers",
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Logs at debug level regardless of the configured filter.
    #[arg(long)]
    pub debug: bool,
    /// Reports failures with their origin and full cause chain.
    #[arg(long)]
    pub traces: bool,
    /// Handoff file written by a parent `tcf` before it re-executed under make.
    #[arg(
        long = "make-jobserver",
        value_name = "PATH",
        require_equals = true,
        num_args = 0..=1,
        default_missing_value = "",
        hide = true
    )]
    pub make_jobserver: Option<String>,
    /// Runs `run` commands without delegating to a make jobserver.
    #[arg(long, conflicts_with = "make_jobserver")]
    pub no_make_jobserver: bool,
    /// Sets KEY (to VALUE, or `true`) in the environment of spawned processes.
    #[arg(short = 'e', long = "environment", value_name = "KEY[=VALUE]")]
    pub environment: Vec<String>,
    #[command(subcommand)]
    pub command: Option<TcfCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum TcfCommand {
    /// Runs a build or test command under the make jobserver.
    Run(RunArgs),
    /// Prints the session cookies stored for a target's broker.
    Cookies(CookiesArgs),
    /// Prints the resolved configuration.
    Config,
    /// Lists the configured brokers.
    Servers,
    /// Drops stored session cookies.
    Logout(LogoutArgs),
}

impl TcfCommand {
    /// Name the command is registered under.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Run(_) => "run",
            Self::Cookies(_) => "cookies",
            Self::Config => "config",
            Self::Servers => "servers",
            Self::Logout(_) => "logout",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Program to run followed by its arguments.
    #[arg(
        value_name = "COMMAND",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub command: Vec<OsString>,
}

#[derive(Args, Debug, Clone)]
pub struct CookiesArgs {
    /// Target name, full target id (`server/target`) or server.
    #[arg(value_name = "TARGET")]
    pub target: String,
    /// Prints cookies in Netscape cookie-jar format.
    #[arg(long)]
    pub cookiejar: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LogoutArgs {
    /// Servers to log out from; all of them when omitted.
    #[arg(value_name = "SERVER")]
    pub servers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use rstest::rstest;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_keeps_hyphenated_arguments() {
        let cli = Cli::try_parse_from(["tcf", "run", "make", "-j4", "--keep-going"])
            .expect("parse run");
        let Some(TcfCommand::Run(args)) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.command, vec!["make", "-j4", "--keep-going"]);
    }

    #[rstest]
    #[case(&["tcf", "--make-jobserver=/tmp/h.mk", "run", "true"], Some("/tmp/h.mk"))]
    #[case(&["tcf", "--make-jobserver", "run", "true"], Some(""))]
    #[case(&["tcf", "run", "true"], None)]
    fn handoff_flag_requires_inline_value(#[case] args: &[&str], #[case] expected: Option<&str>) {
        let cli = Cli::try_parse_from(args).expect("parse");
        assert_eq!(cli.make_jobserver.as_deref(), expected);
    }

    #[test]
    fn handoff_flags_conflict() {
        let error = Cli::try_parse_from([
            "tcf",
            "--make-jobserver=/tmp/h.mk",
            "--no-make-jobserver",
            "run",
            "true",
        ])
        .expect_err("conflicting flags");
        assert_eq!(error.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn environment_is_repeatable() {
        let cli = Cli::try_parse_from(["tcf", "-e", "A=1", "--environment", "B", "servers"])
            .expect("parse");
        assert_eq!(cli.environment, vec!["A=1", "B"]);
        assert_eq!(cli.command.map(|command| command.name()), Some("servers"));
    }
}
