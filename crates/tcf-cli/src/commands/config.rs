//! `tcf config`: where state lives and what was configured.

use std::io::Write;

use serde_json::{Map, json};

use super::mismatched;
use super::render::dump_dotted;
use crate::cli::TcfCommand;
use crate::dispatch::{CommandContext, CommandError, DispatchResult};

pub(super) fn config(
    command: &TcfCommand,
    context: &mut CommandContext<'_>,
) -> Result<DispatchResult, CommandError> {
    if !matches!(command, TcfCommand::Config) {
        return Err(mismatched("config", command));
    }
    let config = context.config;
    let mut servers = Map::new();
    for broker in context.session.brokers() {
        servers.insert(broker.aka(), serde_json::to_value(broker.spec())?);
    }
    let files: Vec<String> = context
        .config_files
        .iter()
        .map(|path| path.display().to_string())
        .collect();

    let summary = json!({
        "state_dir": config.state_dir(),
        "share_dir": config.share_dir(),
        "config_files": files,
        "make_program": config.make_program(),
        "make_jobs": config.make_jobs(),
        "servers": servers,
    });
    context.stdout.write_all(dump_dotted(&summary).as_bytes())?;
    Ok(DispatchResult::from(summary))
}
