//! Bounded parallelism for `run` through make's jobserver.
//!
//! - [`token`] decodes the `--make-jobserver` / `--no-make-jobserver` flags.
//! - [`handoff`] renders and writes the handoff makefile.
//! - [`replace`] abstracts process image replacement.
//! - [`controller`] makes the delegation decision and owns cleanup.
//! - [`error`] captures the fatal handoff failures.

mod controller;
mod error;
mod handoff;
mod replace;
mod token;

/// Tracing target for jobserver coordination.
pub(crate) const JOBSERVER_TARGET_LOG: &str = concat!(env!("CARGO_PKG_NAME"), "::jobserver");

pub use controller::{Coordination, HandoffLease, JobserverController};
pub use error::HandoffError;
pub use handoff::Relaunch;
pub use replace::{ExecReplacer, ProcessReplacer};
pub use token::HandoffToken;
