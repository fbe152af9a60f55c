//! `pageturn probe`: reachability check.

use serde::Serialize;

use crate::cli::GlobalOpts;
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct ProbeReport {
    endpoint: String,
    connected: bool,
}

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = Context::load(global)?;
    let dispatcher = ctx.one_shot(global)?;
    let endpoint = ctx.endpoint(global)?;

    dispatcher.probe_once().await?;

    let report = ProbeReport {
        endpoint: endpoint.to_string(),
        connected: true,
    };
    let out = output::render(&global.output, &report, |r| {
        output::status_line(true, &format!("Connected to {}", r.endpoint), ctx.color)
    })?;
    output::print_output(&out, global.quiet);
    Ok(())
}
