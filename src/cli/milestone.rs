//! The `milestone` subcommand.

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::cli::{
    gitlab::{ApiClientFactory, ListMilestonesOptions, MilestoneState},
    resolve::ResolvedProject,
    session::Session,
    shared::{self, PageArgs},
};

/// Command-line arguments for the `milestone` subcommand.
#[derive(Args, Debug, Default)]
pub struct MilestoneCommandArgs {
    #[command(flatten)]
    pub pages: PageArgs,

    /// Filter by state
    #[arg(long)]
    pub state: Option<MilestoneState>,

    /// Search in titles and descriptions
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,

    /// Fields to include in list output (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<MilestoneField>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum MilestoneField {
    Id,
    Iid,
    Title,
    State,
    Description,
    StartDate,
    DueDate,
    WebUrl,
}

/// Execute the `milestone` subcommand.
pub fn run_milestone(args: MilestoneCommandArgs, session: &Session) -> anyhow::Result<()> {
    let output = milestone(&args, &session.project, session.api())?;

    shared::print_output(&output);

    Ok(())
}

fn milestone(
    args: &MilestoneCommandArgs,
    project: &ResolvedProject,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let options = ListMilestonesOptions {
        state: args.state,
        search: args.search.clone(),
        page: args.pages.page,
        per_page: args.pages.num,
    };
    let milestones = api
        .milestones()
        .list_milestones(project.require_project()?, &options)?;

    shared::format_list(
        &milestones,
        &args.fields,
        &[MilestoneField::Id, MilestoneField::Title, MilestoneField::DueDate],
        &args.pages.format,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        cli::gitlab::{Milestone, fake::FakeGitLab},
        io::OutputFormat,
    };

    #[test]
    fn test_list_milestones_as_json() {
        let api = FakeGitLab {
            milestones: vec![Milestone {
                id: 3,
                iid: 1,
                title: "v1.0".to_string(),
                state: "active".to_string(),
                due_date: Some("2024-06-30".to_string()),
                ..Milestone::default()
            }],
            ..FakeGitLab::default()
        };
        let project = ResolvedProject {
            domain: "gitlab.example.com".to_string(),
            project: "group/app".to_string(),
            token: "token".to_string(),
        };
        let args = MilestoneCommandArgs {
            pages: PageArgs {
                format: OutputFormat::Json,
                ..PageArgs::default()
            },
            fields: vec![MilestoneField::Title, MilestoneField::DueDate],
            ..MilestoneCommandArgs::default()
        };

        let output = milestone(&args, &project, &api).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(
            value,
            serde_json::json!([{"title": "v1.0", "due_date": "2024-06-30"}])
        );
    }
}
