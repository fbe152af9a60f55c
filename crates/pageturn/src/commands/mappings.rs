//! `pageturn mappings`: the button table with current bindings.

use std::fmt::Write as _;

use serde::Serialize;

use pageturn_core::{GamepadButton, LogicalCommand, MappingSnapshot};

use crate::cli::GlobalOpts;
use crate::commands::Context;
use crate::error::CliError;
use crate::output;

#[derive(Serialize)]
struct MappingRow {
    button: &'static str,
    label: &'static str,
    key_code: i32,
    command: Option<&'static str>,
}

fn rows(snapshot: &MappingSnapshot) -> Vec<MappingRow> {
    GamepadButton::all()
        .map(|button| MappingRow {
            button: button.id(),
            label: button.display_name(),
            key_code: button.key_code().0,
            command: snapshot.get(&button.key_code()).copied().map(LogicalCommand::id),
        })
        .collect()
}

fn render_plain(rows: &[MappingRow], color: bool) -> String {
    let mut out = String::new();
    for row in rows {
        let command = row
            .command
            .map_or_else(|| output::dim("-", color), |id| output::highlight(id, color));
        let _ = writeln!(out, "{:<12} {:<8} {:>4}  {command}", row.button, row.label, row.key_code);
    }
    out.trim_end().to_owned()
}

pub fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = Context::load(global)?;
    let snapshot = ctx.mapper()?.snapshot();
    let rows = rows(&snapshot);

    let out = output::render(&global.output, &rows, |r| render_plain(r, ctx.color))?;
    output::print_output(&out, global.quiet);
    Ok(())
}
