//! Config subcommand handlers.

use pageturn_config::{FileSettings, read_file_config, save_config_to};
use pageturn_core::{CoreError, Endpoint, GamepadButton, LogicalCommand, SettingsProvider};

use crate::cli::{Binding, ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::commands::{Context, config_file};
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match &args.command {
        ConfigCommand::Show => show(global),
        ConfigCommand::Path => {
            let path = config_file(global);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }
        ConfigCommand::SetEndpoint { host, port } => set_endpoint(host, port, global),
        ConfigCommand::Map { button, command } => map(*button, *command, global),
        ConfigCommand::ResetMappings => reset_mappings(global),
    }
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = Context::load(global)?;
    let out = match global.output {
        OutputFormat::Plain => toml::to_string_pretty(&ctx.config)
            .map_err(pageturn_config::ConfigError::from)?
            .trim_end()
            .to_owned(),
        OutputFormat::Json => serde_json::to_string_pretty(&ctx.config)?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}

fn set_endpoint(host: &str, port: &str, global: &GlobalOpts) -> Result<(), CliError> {
    let endpoint = Endpoint::parse(host, port).map_err(CoreError::from)?;
    let path = config_file(global);

    let settings = FileSettings::open(&path);
    settings.save(&endpoint).map_err(|e| match e {
        CoreError::SettingsUnavailable { message } => CliError::SettingsUnavailable {
            message,
            path: path.display().to_string(),
        },
        other => other.into(),
    })?;

    let color = output::should_color(&global.color);
    output::print_output(
        &output::status_line(true, &format!("Endpoint set to {endpoint}"), color),
        global.quiet,
    );
    Ok(())
}

fn map(button: GamepadButton, binding: Binding, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config_file(global);
    let mut cfg = read_file_config(&path)?;
    cfg.set_mapping(button, binding.0);
    save_config_to(&path, &cfg)?;

    let target = binding.0.map_or("nothing", LogicalCommand::display_name);
    let color = output::should_color(&global.color);
    output::print_output(
        &output::status_line(true, &format!("{} now triggers {target}", button.display_name()), color),
        global.quiet,
    );
    Ok(())
}

fn reset_mappings(global: &GlobalOpts) -> Result<(), CliError> {
    let path = config_file(global);
    let mut cfg = read_file_config(&path)?;
    cfg.mappings.clear();
    save_config_to(&path, &cfg)?;

    let color = output::should_color(&global.color);
    output::print_output(
        &output::status_line(true, "Mappings reset to defaults", color),
        global.quiet,
    );
    Ok(())
}
