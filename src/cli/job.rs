//! The `job` subcommand.

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::{
    cli::{
        gitlab::{ApiClientFactory, JobScope},
        resolve::ResolvedProject,
        session::Session,
        shared::{self, BrowseArgs, PageArgs},
    },
    io,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Command-line arguments for the `job` subcommand.
#[derive(Args, Debug, Default)]
pub struct JobCommandArgs {
    /// Job ID. Prints the log of that job
    #[arg(value_name = "ID")]
    pub id: Option<u64>,

    #[command(flatten)]
    pub browse: BrowseArgs,

    #[command(flatten)]
    pub pages: PageArgs,

    /// Filter by scope (repeatable)
    #[arg(long, value_delimiter = ',')]
    pub scope: Vec<JobScope>,

    /// Fields to include in list output (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<JobField>,
}

// =============================================================================
// Domain Types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum JobField {
    Id,
    Name,
    Stage,
    Status,
    Ref,
    PipelineId,
    User,
    Duration,
    CreatedAt,
    WebUrl,
}

// =============================================================================
// Command Logic
// =============================================================================

/// Execute the `job` subcommand.
pub fn run_job(args: JobCommandArgs, session: &Session) -> anyhow::Result<()> {
    let output = job(&args, &session.project, session.api())?;

    shared::print_output(&output);

    Ok(())
}

fn job(
    args: &JobCommandArgs,
    project: &ResolvedProject,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let project_path = project.require_project()?;

    if let Some(action) = args.browse.action() {
        io::deliver_url(&job_url(project, args.id), action)?;

        return Ok(String::new());
    }

    match args.id {
        Some(id) => Ok(api
            .jobs()
            .get_job_trace(project_path, id)?
            .trim_end()
            .to_string()),
        None => {
            let jobs = api.jobs().list_jobs(
                project_path,
                &args.scope,
                args.pages.page,
                args.pages.num,
            )?;

            shared::format_list(
                &jobs,
                &args.fields,
                &[JobField::Id, JobField::Stage, JobField::Name, JobField::Status],
                &args.pages.format,
            )
        }
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn job_url(project: &ResolvedProject, id: Option<u64>) -> String {
    match id {
        Some(id) => format!("{}/-/jobs/{id}", project.web_url()),
        None => format!("{}/-/jobs", project.web_url()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::gitlab::{Job, fake::FakeGitLab};

    fn project() -> ResolvedProject {
        ResolvedProject {
            domain: "gitlab.example.com".to_string(),
            project: "group/app".to_string(),
            token: "token".to_string(),
        }
    }

    #[test]
    fn test_prints_trace() {
        let api = FakeGitLab {
            trace: "Running with gitlab-runner\nJob succeeded\n\n".to_string(),
            ..FakeGitLab::default()
        };
        let args = JobCommandArgs {
            id: Some(12),
            ..JobCommandArgs::default()
        };

        let output = job(&args, &project(), &api).unwrap();

        assert_eq!(output, "Running with gitlab-runner\nJob succeeded");
        assert_eq!(api.calls.borrow().as_slice(), ["get_job_trace group/app 12"]);
    }

    #[test]
    fn test_list_passes_every_scope() {
        let api = FakeGitLab {
            jobs: vec![Job {
                id: 5,
                name: "lint".to_string(),
                stage: "test".to_string(),
                status: "failed".to_string(),
                duration: Some(12.5),
                ..Job::default()
            }],
            ..FakeGitLab::default()
        };
        let args = JobCommandArgs {
            scope: vec![JobScope::Failed, JobScope::Canceled],
            fields: vec![JobField::Name, JobField::Duration],
            ..JobCommandArgs::default()
        };

        let output = job(&args, &project(), &api).unwrap();

        assert_eq!(output, "lint  12.5");
        assert_eq!(
            api.calls.borrow().as_slice(),
            ["list_jobs group/app [Failed, Canceled]"]
        );
    }

    #[test]
    fn test_job_urls() {
        assert_eq!(
            job_url(&project(), Some(3)),
            "https://gitlab.example.com/group/app/-/jobs/3"
        );
        assert_eq!(
            job_url(&project(), None),
            "https://gitlab.example.com/group/app/-/jobs"
        );
    }
}
