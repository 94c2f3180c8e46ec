//! `tcf cookies TARGET [--cookiejar]`

use std::io::Write;

use super::mismatched;
use super::render::{render_cookiejar, render_cookies};
use crate::cli::TcfCommand;
use crate::dispatch::{CommandContext, CommandError, DispatchResult};

pub(super) fn cookies(
    command: &TcfCommand,
    context: &mut CommandContext<'_>,
) -> Result<DispatchResult, CommandError> {
    let TcfCommand::Cookies(args) = command else {
        return Err(mismatched("cookies", command));
    };
    let broker = context.session.resolve_broker(&args.target)?;
    let rendered = if args.cookiejar {
        render_cookiejar(broker.hostname(), broker.cookies())
    } else {
        render_cookies(broker.cookies())
    };
    context.stdout.write_all(rendered.as_bytes())?;
    Ok(DispatchResult::Nothing)
}
