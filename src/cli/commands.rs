//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use colored::Colorize;
use tracing::{debug, instrument};

use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see --help".to_string(),
        ));
    };

    let settings = load_settings(cli, command.blueprint())?;
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Tree { blueprint } => tree(&container, blueprint.as_deref()),
        Commands::Routes { blueprint } => routes(&container, blueprint.as_deref()),
        Commands::Inventory { blueprint } => inventory(&container, blueprint.as_deref()),
        Commands::Export { blueprint, output } => {
            export(&container, blueprint.as_deref(), output.as_deref())
        }
        Commands::Validate { blueprint } => validate(&container, blueprint.as_deref()),
        Commands::Config { command } => config(&container, command),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

/// Settings with the blueprint's directory as local config layer and CLI
/// flags on top.
fn load_settings(cli: &Cli, blueprint: Option<&PathBuf>) -> CliResult<Settings> {
    let local_dir = blueprint
        .and_then(|b| b.parent())
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut settings = Settings::load(Some(local_dir))?;

    if let Some(stage) = &cli.stage {
        settings.stage = stage.clone();
    }
    if let Some(region) = &cli.region {
        settings.region = region.clone();
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn blueprint_path(container: &ServiceContainer, blueprint: Option<&Path>) -> PathBuf {
    blueprint
        .map(Path::to_path_buf)
        .unwrap_or_else(|| container.settings.blueprint.clone())
}

#[instrument(skip(container))]
fn tree(container: &ServiceContainer, blueprint: Option<&Path>) -> CliResult<()> {
    let path = blueprint_path(container, blueprint);
    let synthesized = container.gateway().synthesize(&path)?;

    output::header(&format!(
        "{} ({})",
        synthesized.blueprint.name, synthesized.endpoint
    ));
    output::info(&synthesized.model().arena().to_tree_string());
    Ok(())
}

#[instrument(skip(container))]
fn routes(container: &ServiceContainer, blueprint: Option<&Path>) -> CliResult<()> {
    let path = blueprint_path(container, blueprint);
    let synthesized = container.gateway().synthesize(&path)?;

    for (route, method) in synthesized.model().routes() {
        let target = method
            .integration
            .as_ref()
            .map(|i| i.label())
            .unwrap_or_else(|| "-".to_string());
        output::info(&format!(
            "{:<8}{:<40}{}",
            method.http_method.green(),
            route,
            target.dimmed()
        ));
    }
    Ok(())
}

#[instrument(skip(container))]
fn inventory(container: &ServiceContainer, blueprint: Option<&Path>) -> CliResult<()> {
    let path = blueprint_path(container, blueprint);
    let synthesized = container.gateway().synthesize(&path)?;
    let arena = synthesized.model().arena();

    for (i, &idx) in synthesized.resources.resources().iter().enumerate() {
        let full_path = arena.full_path(idx).unwrap_or_default();
        output::info(&format!("{:>4}  {}", i, full_path));
    }
    Ok(())
}

#[instrument(skip(container))]
fn export(
    container: &ServiceContainer,
    blueprint: Option<&Path>,
    target: Option<&Path>,
) -> CliResult<()> {
    let path = blueprint_path(container, blueprint);
    let synthesized = container.gateway().synthesize(&path)?;

    let rendered = toml::to_string_pretty(&synthesized.export()).map_err(|e| {
        InfraError::Export {
            message: e.to_string(),
        }
    })?;

    match target {
        Some(target) => {
            container
                .fs
                .write(target, &rendered)
                .map_err(|e| InfraError::io(format!("write {}", target.display()), e))?;
            output::action("Exported", &target.display());
        }
        None => output::info(&rendered),
    }
    Ok(())
}

#[instrument(skip(container))]
fn validate(container: &ServiceContainer, blueprint: Option<&Path>) -> CliResult<()> {
    let path = blueprint_path(container, blueprint);
    let service = container.gateway();
    let loaded = service.load_blueprint(&path)?;
    let name = loaded.name.clone();
    let synthesized = service.synthesize_blueprint(loaded)?;

    let arena = synthesized.model().arena();
    output::success(&format!(
        "{}: {} resources, {} methods, depth {}",
        name,
        synthesized.resources.resources().len(),
        synthesized.model().routes().len(),
        arena.depth()
    ));
    for leaf in arena.leaf_nodes() {
        output::info(&format!("  {leaf}"));
    }
    Ok(())
}

fn config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("no config directory on this platform"),
            }
            output::action("local", &local_config_path(Path::new(".")).display());
            Ok(())
        }
        ConfigCommands::Init { global, force } => {
            let path = if *global {
                global_config_path().ok_or_else(|| {
                    CliError::Usage("no config directory on this platform".to_string())
                })?
            } else {
                local_config_path(Path::new("."))
            };
            if container.fs.exists(&path) && !force {
                return Err(CliError::Usage(format!(
                    "{} exists, use --force to overwrite",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                container
                    .fs
                    .create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            container
                .fs
                .write(&path, &Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
            Ok(())
        }
    }
}
