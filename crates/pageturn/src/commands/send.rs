//! `pageturn send`: deliver one command.

use serde::Serialize;
use tracing::debug;

use crate::cli::{GlobalOpts, SendArgs};
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct SendReport {
    command: &'static str,
    endpoint: String,
    message: String,
}

pub async fn handle(args: &SendArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = Context::load(global)?;
    let dispatcher = ctx.one_shot(global)?;
    let endpoint = ctx.endpoint(global)?;
    let command = args.command;

    debug!(command = command.id(), %endpoint, "sending");
    dispatcher.execute(command).await?;

    let report = SendReport {
        command: command.id(),
        endpoint: endpoint.to_string(),
        message: format!("{} - OK", command.display_name()),
    };
    let out = output::render(&global.output, &report, |r| {
        output::status_line(true, &r.message, ctx.color)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
