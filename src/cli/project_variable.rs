//! The `project-variable` subcommand.

use clap::{Args, Subcommand};

use crate::{
    cli::{
        gitlab::{ApiClientFactory, VariableOptions},
        session::Session,
        shared,
    },
    io::{self, OutputFormat},
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Command-line arguments for the `project-variable` subcommand.
#[derive(Args, Debug)]
pub struct ProjectVariableCommandArgs {
    #[command(subcommand)]
    pub subcommand: ProjectVariableCommand,
}

/// Available subcommands for the project-variable subcommand.
#[derive(Debug, Subcommand)]
pub enum ProjectVariableCommand {
    /// List the CI/CD variables of the project.
    #[command(alias = "ls")]
    List(ListVariablesArgs),

    /// Create a variable.
    Create(WriteVariableArgs),

    /// Change the value or flags of a variable.
    Update(WriteVariableArgs),

    /// Delete a variable.
    #[command(alias = "rm")]
    Delete(DeleteVariableArgs),
}

/// Arguments for `project-variable list`.
#[derive(Args, Debug, Default)]
pub struct ListVariablesArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for `project-variable create` and `update`.
#[derive(Args, Debug, Default)]
pub struct WriteVariableArgs {
    /// Variable name
    pub key: String,

    /// Variable value
    pub value: String,

    /// Only expose the variable to protected branches and tags
    #[arg(long)]
    pub protected: bool,

    /// Hide the value in job logs
    #[arg(long)]
    pub masked: bool,

    /// Environments the variable is available in
    #[arg(long, value_name = "SCOPE")]
    pub environment_scope: Option<String>,
}

/// Arguments for `project-variable delete`.
#[derive(Args, Debug, Default)]
pub struct DeleteVariableArgs {
    /// Variable name
    pub key: String,
}

impl WriteVariableArgs {
    fn options(&self) -> VariableOptions {
        VariableOptions {
            value: self.value.clone(),
            protected: self.protected.then_some(true),
            masked: self.masked.then_some(true),
            environment_scope: self.environment_scope.clone(),
        }
    }
}

// =============================================================================
// Command Logic
// =============================================================================

/// Execute the `project-variable` subcommand.
pub fn run_project_variable(
    args: ProjectVariableCommandArgs,
    session: &Session,
) -> anyhow::Result<()> {
    let output = project_variable(
        &args.subcommand,
        session.project.require_project()?,
        session.api(),
    )?;

    shared::print_output(&output);

    Ok(())
}

fn project_variable(
    command: &ProjectVariableCommand,
    project: &str,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let variables = api.project_variables();

    match command {
        ProjectVariableCommand::List(args) => {
            let variables = variables.list_variables(project)?;

            match args.format {
                OutputFormat::Json => io::format::<_, &str>(&variables, &[], &args.format),
                _ => io::format(
                    &variables,
                    &["key", "value", "protected", "masked", "environment_scope"],
                    &args.format,
                ),
            }
        }
        ProjectVariableCommand::Create(args) => {
            let variable = variables.create_variable(project, &args.key, &args.options())?;

            Ok(format!("Variable {} created", variable.key))
        }
        ProjectVariableCommand::Update(args) => {
            let variable = variables.update_variable(project, &args.key, &args.options())?;

            Ok(format!("Variable {} updated", variable.key))
        }
        ProjectVariableCommand::Delete(args) => {
            variables.remove_variable(project, &args.key)?;

            Ok(format!("Variable {} deleted", args.key))
        }
    }
}
