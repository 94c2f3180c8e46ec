//! `tcf run COMMAND [ARG]...`

use std::io::{self, Write};
use std::process::{Command, ExitStatus};

use tracing::info;

use super::{COMMANDS_TARGET, mismatched};
use crate::cli::TcfCommand;
use crate::dispatch::{CommandContext, CommandError, DispatchResult};

pub(super) fn run(
    command: &TcfCommand,
    context: &mut CommandContext<'_>,
) -> Result<DispatchResult, CommandError> {
    let TcfCommand::Run(args) = command else {
        return Err(mismatched("run", command));
    };
    let Some((program, arguments)) = args.command.split_first() else {
        return Err(CommandError::Launch {
            program: String::new(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "no command to run"),
        });
    };
    let shown = program.to_string_lossy().into_owned();
    // Handlers may have buffered output; keep it ahead of the child's.
    context.stdout.flush()?;

    info!(target: COMMANDS_TARGET, program = %shown, "running command");
    let status = Command::new(program)
        .args(arguments)
        .status()
        .map_err(|source| CommandError::Launch {
            program: shown,
            source,
        })?;
    Ok(result_from_status(status))
}

fn result_from_status(status: ExitStatus) -> DispatchResult {
    match status.code() {
        Some(code) => DispatchResult::Integer(i64::from(code)),
        None => DispatchResult::Other(termination(status)),
    }
}

#[cfg(unix)]
fn termination(status: ExitStatus) -> String {
    use std::os::unix::process::ExitStatusExt;

    status
        .signal()
        .map_or_else(|| String::from("terminated"), |signal| format!("signal {signal}"))
}

#[cfg(not(unix))]
fn termination(_status: ExitStatus) -> String {
    String::from("terminated")
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::process::ExitStatusExt;

    use super::*;

    #[test]
    fn exit_codes_become_integers() {
        let status = ExitStatus::from_raw(3 << 8);
        assert_eq!(result_from_status(status), DispatchResult::Integer(3));
    }

    #[test]
    fn signals_are_unrecognised_shapes() {
        let status = ExitStatus::from_raw(9);
        let result = result_from_status(status);
        assert_eq!(result, DispatchResult::Other(String::from("signal 9")));
        assert_eq!(result.exit_status(), 1);
    }
}
