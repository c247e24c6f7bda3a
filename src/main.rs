//! Looper Editor CLI
//!
//! Command-line interface over saved looper projects.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{debug, info};

use looper_editor::cli::{commands, Cli, Commands};
use looper_editor::session::SettingsForm;
use looper_editor::EditorConfig;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let (config, sources) =
        EditorConfig::load(cli.config.as_deref()).context("failed to load editor config")?;

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { config.log_level.as_str() };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!(
        "Config files: {:?}, env overrides: {:?}",
        sources.files, sources.env_overrides
    );
    info!("Looper Editor v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(&config, cmd),
        None => {
            println!("Looper Editor v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(config: &EditorConfig, cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Kinds => commands::kinds()?,
        Commands::Projects => commands::projects(config)?,
        Commands::New { project } => commands::new_project(config, &project)
            .with_context(|| format!("failed to create project '{}'", project))?,
        Commands::Show { project } => commands::show(config, &project)?,
        Commands::Configure {
            project,
            layer,
            name,
            kind,
            fields,
            inputs,
            outputs,
        } => {
            let mut form = SettingsForm::new(name, kind);
            form.fields.extend(fields);
            form.input_channels = inputs;
            form.output_channels = outputs;
            commands::configure(config, &project, layer, &form)?
        }
        Commands::AddSegment {
            project,
            layer,
            start,
            stop,
            polarity,
        } => commands::add_segment(config, &project, layer, start, stop, polarity)?,
        Commands::UpdateSegment {
            project,
            layer,
            segment,
            start,
            stop,
            polarity,
        } => commands::update_segment(config, &project, layer, segment, start, stop, polarity)?,
        Commands::At {
            project,
            layer,
            measure,
        } => commands::at(config, &project, layer, measure)?,
        Commands::PlayRequest { project, out } => {
            commands::play_request(config, &project, out.as_deref())?
        }
    }
    Ok(())
}
