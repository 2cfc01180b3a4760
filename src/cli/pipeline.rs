//! The `pipeline` subcommand.

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::{
    cli::{
        gitlab::{
            ApiClientFactory, ListPipelinesOptions, PipelineOrderBy, PipelineScope,
            PipelineStatus, Sort,
        },
        job::JobField,
        resolve::ResolvedProject,
        session::Session,
        shared::{self, BrowseArgs, PageArgs},
    },
    io,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Command-line arguments for the `pipeline` subcommand.
#[derive(Args, Debug, Default)]
pub struct PipelineCommandArgs {
    /// Pipeline ID. Lists the jobs of that pipeline
    #[arg(value_name = "ID")]
    pub id: Option<u64>,

    #[command(flatten)]
    pub browse: BrowseArgs,

    #[command(flatten)]
    pub pages: PageArgs,

    /// Filter by scope
    #[arg(long)]
    pub scope: Option<PipelineScope>,

    /// Filter by status
    #[arg(long)]
    pub status: Option<PipelineStatus>,

    /// Filter by branch or tag
    #[arg(long = "ref", value_name = "REF")]
    pub git_ref: Option<String>,

    /// Order by this field
    #[arg(long = "orderby", value_name = "FIELD")]
    pub order_by: Option<PipelineOrderBy>,

    /// Sort order
    #[arg(long)]
    pub sort: Option<Sort>,

    /// Fields to include in list output (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<PipelineField>,
}

// =============================================================================
// Domain Types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum PipelineField {
    Id,
    Status,
    Ref,
    Sha,
    Source,
    CreatedAt,
    UpdatedAt,
    WebUrl,
}

// =============================================================================
// Command Logic
// =============================================================================

/// Execute the `pipeline` subcommand.
pub fn run_pipeline(args: PipelineCommandArgs, session: &Session) -> anyhow::Result<()> {
    let output = pipeline(&args, &session.project, session.api())?;

    shared::print_output(&output);

    Ok(())
}

fn pipeline(
    args: &PipelineCommandArgs,
    project: &ResolvedProject,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let project_path = project.require_project()?;

    if let Some(action) = args.browse.action() {
        io::deliver_url(&pipeline_url(project, args.id), action)?;

        return Ok(String::new());
    }

    match args.id {
        Some(id) => {
            let jobs = api.pipelines().list_pipeline_jobs(project_path, id)?;

            shared::format_list::<_, JobField>(
                &jobs,
                &[],
                &[JobField::Id, JobField::Stage, JobField::Name, JobField::Status],
                &args.pages.format,
            )
        }
        None => {
            let options = ListPipelinesOptions {
                scope: args.scope,
                status: args.status,
                git_ref: args.git_ref.clone(),
                order_by: args.order_by,
                sort: args.sort,
                page: args.pages.page,
                per_page: args.pages.num,
            };
            let pipelines = api.pipelines().list_pipelines(project_path, &options)?;

            shared::format_list(
                &pipelines,
                &args.fields,
                &[
                    PipelineField::Id,
                    PipelineField::Status,
                    PipelineField::Ref,
                    PipelineField::CreatedAt,
                ],
                &args.pages.format,
            )
        }
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn pipeline_url(project: &ResolvedProject, id: Option<u64>) -> String {
    match id {
        Some(id) => format!("{}/-/pipelines/{id}", project.web_url()),
        None => format!("{}/-/pipelines", project.web_url()),
    }
}
