//! CLI entrypoint for the `tcf` test-target client.
//!
//! The binary delegates to [`tcf_cli::run`], which loads configuration,
//! processes command-line arguments and dispatches the requested command.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    tcf_cli::run(std::env::args_os(), &mut stdout, &mut stderr)
}
