//! `tcf servers` and `tcf logout [SERVER]...`

use std::io::Write;

use serde_json::{Map, Value};
use tracing::info;

use super::{COMMANDS_TARGET, mismatched};
use crate::cli::TcfCommand;
use crate::dispatch::{CommandContext, CommandError, DispatchResult};

/// Placeholder printed for a server with no recorded origin.
const NO_ORIGIN: &str = "-";

pub(super) fn servers(
    command: &TcfCommand,
    context: &mut CommandContext<'_>,
) -> Result<DispatchResult, CommandError> {
    if !matches!(command, TcfCommand::Servers) {
        return Err(mismatched("servers", command));
    }
    let mut listing = Map::new();
    for broker in context.session.brokers() {
        let spec = broker.spec();
        let origin = spec.origin.as_deref().unwrap_or(NO_ORIGIN);
        writeln!(context.stdout, "{} {} {origin}", broker.aka(), spec.url)?;
        listing.insert(broker.aka(), Value::String(spec.url.to_string()));
    }
    Ok(DispatchResult::Mapping(listing))
}

pub(super) fn logout(
    command: &TcfCommand,
    context: &mut CommandContext<'_>,
) -> Result<DispatchResult, CommandError> {
    let TcfCommand::Logout(args) = command else {
        return Err(mismatched("logout", command));
    };
    if context.session.brokers().is_empty() {
        info!(target: COMMANDS_TARGET, "no servers configured, nothing to log out of");
        return Ok(DispatchResult::Bool(false));
    }
    let cleared = context.session.logout(&args.servers)?;
    info!(target: COMMANDS_TARGET, cleared, "logged out");
    Ok(DispatchResult::Bool(true))
}
