mod gitlab {
    mod client;
    mod common;
    mod http_client;
    mod issue;
    mod job;
    mod label;
    mod lint;
    mod merge_request;
    mod milestone;
    mod note;
    mod pipeline;
    mod project_variable;
    mod repository;
    mod runner;
    mod user;

    #[cfg(test)]
    pub mod fake;

    pub use client::{ApiClientFactory, GitLabClient};
    pub use common::{OrderBy, Scope, Sort, StateEvent};
    pub use issue::{
        CreateIssueOptions, Issue, IssueClient, IssueState, ListIssuesOptions, UpdateIssueOptions,
    };
    pub use job::{Job, JobClient, JobScope};
    pub use label::{LabelClient, ListLabelsOptions};
    pub use lint::{LintClient, LintResult};
    pub use merge_request::{
        CreateMergeRequestOptions, ListMergeRequestsOptions, MergeRequest, MergeRequestClient,
        MergeRequestState, UpdateMergeRequestOptions,
    };
    pub use milestone::{ListMilestonesOptions, MilestoneClient, MilestoneState};
    pub use note::{Note, NoteClient};
    pub use pipeline::{
        ListPipelinesOptions, PipelineClient, PipelineOrderBy, PipelineScope, PipelineStatus,
    };
    pub use project_variable::{ProjectVariableClient, VariableOptions};
    pub use repository::RepositoryClient;
    pub use runner::{ListRunnersOptions, RunnerClient, RunnerSource, RunnerStatus, RunnerType};
    pub use user::{ListUsersOptions, UserClient};

    #[cfg(test)]
    pub use {
        label::Label, milestone::Milestone, pipeline::Pipeline, project_variable::ProjectVariable,
        repository::TreeEntry, runner::Runner, user::User,
    };
}

mod browse;
mod completions;
mod config;
mod issue;
mod job;
mod label;
mod lint;
mod merge_request;
mod milestone;
mod pipeline;
mod project_variable;
mod resolve;
mod runner;
mod session;
mod shared;
mod user;

pub use browse::browse_project;
pub use completions::generate_completions;
pub use config::{ConfigCommand, config_default, config_edit, config_list, config_path, config_set};
pub use issue::run_issue;
pub use job::run_job;
pub use label::run_label;
pub use lint::run_lint;
pub use merge_request::run_merge_request;
pub use milestone::run_milestone;
pub use pipeline::run_pipeline;
pub use project_variable::run_project_variable;
pub use runner::run_runner;
pub use session::Session;
pub use user::run_user;

use std::sync::LazyLock;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use regex::Regex;

use crate::{
    cli::{
        browse::BrowseCommandArgs, completions::CompletionsCommandArgs, config::ConfigCommandArgs,
        issue::IssueCommandArgs, job::JobCommandArgs, label::LabelCommandArgs,
        lint::LintCommandArgs, merge_request::MergeRequestCommandArgs,
        milestone::MilestoneCommandArgs, pipeline::PipelineCommandArgs,
        project_variable::ProjectVariableCommandArgs, resolve::ResolveOptions,
        runner::RunnerCommandArgs, user::UserCommandArgs,
    },
    error::LabError,
};

#[derive(Parser)]
#[command(name = "lab", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,

    #[command(subcommand)]
    pub subcommand: LabCommand,
}

/// Options that pick the GitLab instance and project. Accepted by every
/// subcommand.
#[derive(Args, Debug, Default)]
pub struct GlobalArgs {
    /// Use the profile of this domain, e.g. gitlab.com
    #[arg(long, global = true, value_name = "DOMAIN")]
    pub profile: Option<String>,

    /// Target project, e.g. group/project
    #[arg(short, long, global = true, value_name = "NS/PROJECT")]
    pub project: Option<String>,

    /// Target repository, e.g. group/project
    #[arg(
        long,
        global = true,
        value_name = "NS/PROJECT",
        value_parser = parse_repository,
        conflicts_with = "project"
    )]
    pub repository: Option<String>,
}

impl GlobalArgs {
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            profile: self.profile.clone(),
            project: self.project.clone().or_else(|| self.repository.clone()),
        }
    }
}

#[derive(Subcommand)]
pub enum LabCommand {
    /// Browse the project or a file in it.
    #[command(alias = "br")]
    Browse(BrowseCommandArgs),

    /// Generate shell completions.
    Completions(CompletionsCommandArgs),

    /// Manage the config file and its profiles.
    Config(ConfigCommandArgs),

    /// List, show, create and update issues.
    #[command(alias = "i")]
    Issue(IssueCommandArgs),

    /// List jobs or print a job's log.
    Job(JobCommandArgs),

    /// List labels.
    Label(LabelCommandArgs),

    /// Validate a CI configuration file.
    Lint(LintCommandArgs),

    /// List, show, create and update merge requests.
    #[command(alias = "mr")]
    MergeRequest(MergeRequestCommandArgs),

    /// List milestones.
    Milestone(MilestoneCommandArgs),

    /// List pipelines or the jobs of a pipeline.
    #[command(alias = "pl")]
    Pipeline(PipelineCommandArgs),

    /// Manage CI/CD variables of the project.
    #[command(alias = "pv")]
    ProjectVariable(ProjectVariableCommandArgs),

    /// List runners.
    Runner(RunnerCommandArgs),

    /// List users.
    User(UserCommandArgs),
}

/// `namespace[/subgroup...]/project`.
static REPOSITORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.-]+(/[\w.-]+)+$").expect("repository pattern is valid")
});

fn parse_repository(value: &str) -> Result<String, LabError> {
    if !REPOSITORY.is_match(value) {
        return Err(LabError::InvalidRepository(value.to_string()));
    }

    Ok(value.to_string())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_repository() {
        assert_eq!(parse_repository("group/app").unwrap(), "group/app");
        assert_eq!(
            parse_repository("group/sub-group/my.app").unwrap(),
            "group/sub-group/my.app"
        );
        assert!(matches!(
            parse_repository("app"),
            Err(LabError::InvalidRepository(value)) if value == "app"
        ));
        assert!(parse_repository("group/").is_err());
        assert!(parse_repository("/app").is_err());
    }

    #[test]
    fn test_global_args_after_subcommand() {
        let cli = Cli::try_parse_from(["lab", "issue", "3", "--profile", "gitlab.example.com"])
            .unwrap();

        assert_eq!(cli.global.profile.as_deref(), Some("gitlab.example.com"));
        assert!(matches!(cli.subcommand, LabCommand::Issue(args) if args.iid == Some(3)));
    }

    #[test]
    fn test_repository_becomes_the_project() {
        let cli = Cli::try_parse_from(["lab", "--repository", "group/app", "label"]).unwrap();

        assert_eq!(
            cli.global.resolve_options(),
            ResolveOptions {
                profile: None,
                project: Some("group/app".to_string()),
            }
        );
    }

    #[test]
    fn test_repository_conflicts_with_project() {
        let result =
            Cli::try_parse_from(["lab", "-p", "group/app", "--repository", "group/other", "user"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_repository_is_a_parse_error() {
        let result = Cli::try_parse_from(["lab", "--repository", "nope", "label"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_subcommand_aliases() {
        for (alias, expected) in [("mr", "MergeRequest"), ("pv", "ProjectVariable"), ("pl", "Pipeline")]
        {
            let args: Vec<&str> = match alias {
                "pv" => vec!["lab", alias, "list"],
                _ => vec!["lab", alias],
            };
            let cli = Cli::try_parse_from(args).unwrap();
            let name = match cli.subcommand {
                LabCommand::MergeRequest(_) => "MergeRequest",
                LabCommand::ProjectVariable(_) => "ProjectVariable",
                LabCommand::Pipeline(_) => "Pipeline",
                _ => "other",
            };

            assert_eq!(name, expected);
        }
    }
}
