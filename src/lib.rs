mod cli;
mod error;
mod git;
mod io;

use clap::Parser;
use tracing_log::AsTrace;

use crate::cli::{Cli, ConfigCommand, LabCommand, Session};

pub use error::exit_status_for;

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::try_parse()?;

    tracing_subscriber::fmt()
        .with_max_level(cli.verbose.log_level_filter().as_trace())
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let session = || Session::open(&cli.global);

    match cli.subcommand {
        LabCommand::Browse(args) => cli::browse_project(args, &session()?),
        LabCommand::Completions(args) => cli::generate_completions(args),
        LabCommand::Config(args) => match args.subcommand {
            ConfigCommand::Path => cli::config_path(),
            ConfigCommand::List => cli::config_list(),
            ConfigCommand::Set(args) => cli::config_set(args),
            ConfigCommand::Default(args) => cli::config_default(args),
            ConfigCommand::Edit => cli::config_edit(),
        },
        LabCommand::Issue(args) => cli::run_issue(args, &session()?),
        LabCommand::Job(args) => cli::run_job(args, &session()?),
        LabCommand::Label(args) => cli::run_label(args, &session()?),
        LabCommand::Lint(args) => cli::run_lint(args, session),
        LabCommand::MergeRequest(args) => cli::run_merge_request(args, &session()?),
        LabCommand::Milestone(args) => cli::run_milestone(args, &session()?),
        LabCommand::Pipeline(args) => cli::run_pipeline(args, &session()?),
        LabCommand::ProjectVariable(args) => cli::run_project_variable(args, &session()?),
        LabCommand::Runner(args) => cli::run_runner(args, &session()?),
        LabCommand::User(args) => cli::run_user(args, &session()?),
    }
}
