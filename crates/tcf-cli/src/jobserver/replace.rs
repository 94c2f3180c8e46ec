//! Process image replacement.

use std::ffi::{OsStr, OsString};
use std::io;

/// Replaces the running process with another program.
///
/// Implementations only return on failure; success never comes back.
pub trait ProcessReplacer {
    /// Replaces the current process with `program args...`.
    fn replace(&mut self, program: &OsStr, args: &[OsString]) -> io::Error;
}

impl<R: ProcessReplacer + ?Sized> ProcessReplacer for &mut R {
    fn replace(&mut self, program: &OsStr, args: &[OsString]) -> io::Error {
        (**self).replace(program, args)
    }
}

/// Replacement through `execvp(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecReplacer;

#[cfg(unix)]
impl ProcessReplacer for ExecReplacer {
    fn replace(&mut self, program: &OsStr, args: &[OsString]) -> io::Error {
        use std::os::unix::process::CommandExt;
        use std::process::Command;

        Command::new(program).args(args).exec()
    }
}

#[cfg(not(unix))]
impl ProcessReplacer for ExecReplacer {
    fn replace(&mut self, _program: &OsStr, _args: &[OsString]) -> io::Error {
        io::Error::new(
            io::ErrorKind::Unsupported,
            "process replacement requires a Unix platform",
        )
    }
}
