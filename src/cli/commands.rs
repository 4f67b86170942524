//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, instrument};

use crate::application::services::CompanyTreeOutput;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands, InputArgs};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, local_config_path, Settings};
use crate::domain::{CompanyId, DomainError};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::TreeNodeConvert;

/// Execute the parsed command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `costtree --help`".to_string(),
        ));
    };

    match command {
        Commands::Build {
            input,
            output,
            compact,
            strict,
        } => {
            let mut settings = load_settings(cli)?;
            if let Some(path) = output {
                settings.output = path.clone();
            }
            if *compact {
                settings.pretty = false;
            }
            if *strict {
                settings.strict_expenses = true;
            }
            cmd_build(settings, input)
        }
        Commands::Tree { input } => cmd_tree(load_settings(cli)?, input),
        Commands::Cost { input, id } => cmd_cost(load_settings(cli)?, input, id),
        Commands::Config { command } => cmd_config(cli, command),
        Commands::Completion { shell } => {
            cmd_completion(*shell);
            Ok(())
        }
    }
}

fn config_dir(cli: &Cli) -> CliResult<PathBuf> {
    match &cli.config_dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir()
            .map_err(|e| CliError::from(InfraError::io("determine working directory", e))),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let dir = config_dir(cli)?;
    let settings = Settings::load(Some(dir.as_path()))?;
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn require_file(container: &ServiceContainer, path: &Path) -> CliResult<()> {
    if container.fs.is_file(path) {
        Ok(())
    } else {
        Err(CliError::InvalidArgs(format!(
            "input file not found: {}",
            path.display()
        )))
    }
}

fn run_pipeline(container: &ServiceContainer, input: &InputArgs) -> CliResult<CompanyTreeOutput> {
    require_file(container, &input.travels)?;
    require_file(container, &input.companies)?;
    Ok(container
        .company_tree()
        .build(&input.travels, &input.companies)?)
}

#[instrument(skip(settings))]
fn cmd_build(settings: Settings, input: &InputArgs) -> CliResult<()> {
    let target = settings.output.clone();
    let container = ServiceContainer::new(settings);
    let result = run_pipeline(&container, input)?;

    container
        .company_tree()
        .write_output(&result.views, &target)?;

    output::success(&format!(
        "{} root companies ({} companies, total cost {}) written to {}",
        result.views.len(),
        result.forest.len(),
        result.total_cost,
        target.display()
    ));
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_tree(settings: Settings, input: &InputArgs) -> CliResult<()> {
    let container = ServiceContainer::new(settings);
    let result = run_pipeline(&container, input)?;

    for view in &result.views {
        output::info(&view.to_tree_string());
    }
    output::header(&format!("total cost: {}", result.total_cost));
    Ok(())
}

#[instrument(skip(settings))]
fn cmd_cost(settings: Settings, input: &InputArgs, id: &str) -> CliResult<()> {
    let container = ServiceContainer::new(settings);
    let mut result = run_pipeline(&container, input)?;

    let company_id = CompanyId::from(id);
    let cost = match result.forest.effective_cost_of(&company_id) {
        Ok(cost) => cost,
        Err(DomainError::NodeNotFound) => {
            return Err(CliError::InvalidArgs(format!("unknown company: {id}")))
        }
        Err(e) => return Err(ApplicationError::from(e).into()),
    };
    output::info(&cost);
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            let local = local_config_path(&config_dir(cli)?);
            match global_config_path() {
                Some(global) => output::detail(&describe_path("global", &global)),
                None => output::detail("global: (no config directory)"),
            }
            output::detail(&describe_path("local", &local));
        }
        ConfigCommands::Template => output::info(&Settings::template()),
    }
    Ok(())
}

fn describe_path(label: &str, path: &Path) -> String {
    let state = if path.exists() { "" } else { " (not found)" };
    format!("{label}: {}{state}", path.display())
}

fn cmd_completion(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
