//! The `label` subcommand.

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::cli::{
    gitlab::{ApiClientFactory, ListLabelsOptions},
    resolve::ResolvedProject,
    session::Session,
    shared::{self, PageArgs},
};

/// Command-line arguments for the `label` subcommand.
#[derive(Args, Debug, Default)]
pub struct LabelCommandArgs {
    #[command(flatten)]
    pub pages: PageArgs,

    /// Only labels whose name contains this text
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Fields to include in list output (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<LabelField>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum LabelField {
    Id,
    Name,
    Color,
    Description,
    OpenIssuesCount,
    OpenMergeRequestsCount,
}

/// Execute the `label` subcommand.
pub fn run_label(args: LabelCommandArgs, session: &Session) -> anyhow::Result<()> {
    let output = label(&args, &session.project, session.api())?;

    shared::print_output(&output);

    Ok(())
}

fn label(
    args: &LabelCommandArgs,
    project: &ResolvedProject,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let options = ListLabelsOptions {
        search: args.search.clone(),
        with_counts: args.fields.iter().any(|field| {
            matches!(
                field,
                LabelField::OpenIssuesCount | LabelField::OpenMergeRequestsCount
            )
        }),
        page: args.pages.page,
        per_page: args.pages.num,
    };
    let labels = api.labels().list_labels(project.require_project()?, &options)?;

    shared::format_list(
        &labels,
        &args.fields,
        &[LabelField::Name, LabelField::Description],
        &args.pages.format,
    )
}
