//! The `runner` subcommand.

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::cli::{
    gitlab::{ApiClientFactory, ListRunnersOptions, RunnerSource, RunnerStatus, RunnerType},
    resolve::ResolvedProject,
    session::Session,
    shared::{self, PageArgs},
};

/// Command-line arguments for the `runner` subcommand.
#[derive(Args, Debug, Default)]
pub struct RunnerCommandArgs {
    #[command(flatten)]
    pub pages: PageArgs,

    /// List the runners you own instead of the project's
    #[arg(long, conflicts_with = "all")]
    pub owned: bool,

    /// List every runner of the instance (administrators only)
    #[arg(long)]
    pub all: bool,

    /// Filter by status
    #[arg(long)]
    pub status: Option<RunnerStatus>,

    /// Filter by runner type
    #[arg(long = "type", value_name = "TYPE")]
    pub runner_type: Option<RunnerType>,

    /// Fields to include in list output (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<RunnerField>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum RunnerField {
    Id,
    Description,
    Name,
    RunnerType,
    IsShared,
    Paused,
    Online,
    Status,
}

/// Execute the `runner` subcommand.
pub fn run_runner(args: RunnerCommandArgs, session: &Session) -> anyhow::Result<()> {
    let output = runner(&args, &session.project, session.api())?;

    shared::print_output(&output);

    Ok(())
}

fn runner(
    args: &RunnerCommandArgs,
    project: &ResolvedProject,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let source = if args.all {
        RunnerSource::All
    } else if args.owned {
        RunnerSource::Owned
    } else {
        RunnerSource::Project(project.require_project()?)
    };
    let options = ListRunnersOptions {
        status: args.status,
        runner_type: args.runner_type,
        page: args.pages.page,
        per_page: args.pages.num,
    };
    let runners = api.runners().list_runners(source, &options)?;

    shared::format_list(
        &runners,
        &args.fields,
        &[RunnerField::Id, RunnerField::Description, RunnerField::Status],
        &args.pages.format,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::gitlab::{Runner, fake::FakeGitLab};

    fn fake() -> FakeGitLab {
        FakeGitLab {
            runners: vec![Runner {
                id: 8,
                description: Some("docker-runner".to_string()),
                status: "online".to_string(),
                ..Runner::default()
            }],
            ..FakeGitLab::default()
        }
    }

    fn project() -> ResolvedProject {
        ResolvedProject {
            domain: "gitlab.example.com".to_string(),
            project: "group/app".to_string(),
            token: "token".to_string(),
        }
    }

    #[test]
    fn test_lists_project_runners_by_default() {
        let api = fake();

        let output = runner(&RunnerCommandArgs::default(), &project(), &api).unwrap();

        assert_eq!(output, "8  docker-runner  online");
        assert_eq!(
            api.calls.borrow().as_slice(),
            ["list_runners Project(\"group/app\")"]
        );
    }

    #[test]
    fn test_owned_and_all_do_not_need_a_project() {
        let api = fake();
        let no_project = ResolvedProject {
            project: String::new(),
            ..project()
        };

        for (args, call) in [
            (
                RunnerCommandArgs {
                    owned: true,
                    ..RunnerCommandArgs::default()
                },
                "list_runners Owned",
            ),
            (
                RunnerCommandArgs {
                    all: true,
                    ..RunnerCommandArgs::default()
                },
                "list_runners All",
            ),
        ] {
            runner(&args, &no_project, &api).unwrap();

            assert_eq!(api.calls.borrow().last().map(String::as_str), Some(call));
        }
    }
}
