//! The `issue` subcommand.

use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::{
    cli::{
        config::Profile,
        gitlab::{
            ApiClientFactory, CreateIssueOptions, Issue, IssueState, ListIssuesOptions, Scope,
            UpdateIssueOptions,
        },
        resolve::ResolvedProject,
        session::Session,
        shared::{self, BrowseArgs, ListArgs, Mode, ModeInputs, WriteArgs},
    },
    io,
};

const TEMPLATE_DIR: &str = ".gitlab/issue_templates";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Command-line arguments for the `issue` subcommand.
#[derive(Args, Debug, Default)]
pub struct IssueCommandArgs {
    /// Issue IID. Shows or updates that issue; lists or creates issues
    /// without it
    #[arg(value_name = "IID")]
    pub iid: Option<u64>,

    #[command(flatten)]
    pub browse: BrowseArgs,

    #[command(flatten)]
    pub write: WriteArgs,

    #[command(flatten)]
    pub list: ListArgs,

    /// Filter by state [default: opened]
    #[arg(long)]
    pub state: Option<IssueState>,

    /// List issues of all projects
    #[arg(short = 'A', long)]
    pub all_project: bool,

    /// List issues assigned to you
    #[arg(long)]
    pub mine: bool,

    /// Show the comments as well
    #[arg(long)]
    pub comment: bool,

    /// Fields to include in list output (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<IssueField>,
}

// =============================================================================
// Domain Types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum IssueField {
    Iid,
    Reference,
    Title,
    State,
    Author,
    Assignee,
    Milestone,
    Labels,
    CreatedAt,
    UpdatedAt,
    WebUrl,
}

// =============================================================================
// Command Logic
// =============================================================================

/// Execute the `issue` subcommand.
pub fn run_issue(args: IssueCommandArgs, session: &Session) -> anyhow::Result<()> {
    let output = issue(&args, &session.project, &session.profile(), session.api())?;

    shared::print_output(&output);

    Ok(())
}

fn issue(
    args: &IssueCommandArgs,
    project: &ResolvedProject,
    profile: &Profile,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let mode = shared::select_mode(&ModeInputs {
        iid: args.iid,
        browse: args.browse.action(),
        editor: args.write.editor,
        has_fields: args.write.has_fields(),
        list_templates: args.write.list_template,
        all_projects: args.all_project,
        mine: args.mine,
    });

    tracing::debug!(?mode, "issue");

    match mode {
        Mode::Browse(action) => {
            io::deliver_url(&issue_url(project, args.iid)?, action)?;

            Ok(String::new())
        }
        Mode::UpdateOnEditor(iid) => update_issue_on_editor(project, iid, api),
        Mode::Update(iid) => update_issue(args, project, iid, api),
        Mode::Show(iid) => show_issue(project, iid, args.comment, api),
        Mode::CreateOnEditor => create_issue_on_editor(args, project, profile, api),
        Mode::Create => create_issue(args, project, profile, api),
        Mode::ListTemplates => {
            let templates = shared::list_templates(api, project.require_project()?, TEMPLATE_DIR)?;

            Ok(templates.join("\n"))
        }
        Mode::ListAll => {
            let issues = api.issues().list_all_issues(&list_options(args, None))?;

            shared::format_list(
                &issues,
                &args.fields,
                &[IssueField::Reference, IssueField::Title],
                &args.list.pages.format,
            )
        }
        Mode::ListMine => {
            let issues = api.issues().list_project_issues(
                project.require_project()?,
                &list_options(args, Some(Scope::AssignedToMe)),
            )?;

            shared::format_list(
                &issues,
                &args.fields,
                &[IssueField::Iid, IssueField::Title],
                &args.list.pages.format,
            )
        }
        Mode::List => {
            let issues = api
                .issues()
                .list_project_issues(project.require_project()?, &list_options(args, None))?;

            shared::format_list(
                &issues,
                &args.fields,
                &[IssueField::Iid, IssueField::Title],
                &args.list.pages.format,
            )
        }
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn issue_url(project: &ResolvedProject, iid: Option<u64>) -> anyhow::Result<String> {
    project.require_project()?;

    Ok(match iid {
        Some(iid) => format!("{}/-/issues/{iid}", project.web_url()),
        None => format!("{}/-/issues", project.web_url()),
    })
}

fn list_options(args: &IssueCommandArgs, scope: Option<Scope>) -> ListIssuesOptions {
    ListIssuesOptions {
        state: Some(args.state.unwrap_or(IssueState::Opened)),
        scope: scope.or(args.list.scope),
        order_by: args.list.order_by,
        sort: args.list.sort,
        search: args.list.search.clone(),
        page: args.list.pages.page,
        per_page: args.list.pages.num,
    }
}

fn show_issue(
    project: &ResolvedProject,
    iid: u64,
    with_comments: bool,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let project = project.require_project()?;
    let issue = api.issues().get_issue(project, iid)?;
    let mut output = format_issue_detail(&issue);

    if with_comments {
        output.push_str(&shared::format_notes(
            &api.notes().list_issue_notes(project, iid)?,
        ));
    }

    Ok(output.trim_end().to_string())
}

fn format_issue_detail(issue: &Issue) -> String {
    format!(
        "#{} {}\n\
         --\n\
         state:     {}\n\
         author:    {}\n\
         assignee:  {}\n\
         milestone: {}\n\
         labels:    {}\n\
         created:   {}\n\
         updated:   {}\n\
         url:       {}\n\
         \n\
         {}\n",
        issue.iid,
        issue.title,
        issue.state,
        issue.author,
        issue.assignee,
        issue.milestone,
        issue.labels.join(", "),
        issue.created_at,
        issue.updated_at,
        issue.web_url,
        issue.description,
    )
}

fn create_issue(
    args: &IssueCommandArgs,
    project: &ResolvedProject,
    profile: &Profile,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let (title, description) = args.write.title_and_description()?;

    submit_issue(args, project, profile, api, title, description)
}

fn create_issue_on_editor(
    args: &IssueCommandArgs,
    project: &ResolvedProject,
    profile: &Profile,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let initial = match &args.write.template {
        Some(name) => shared::load_template(api, project.require_project()?, TEMPLATE_DIR, name)?,
        None => String::new(),
    };
    let message = io::prompt_with_text_editor(&initial)?;
    let description = (!message.body.is_empty()).then_some(message.body);

    submit_issue(args, project, profile, api, message.title, description)
}

fn submit_issue(
    args: &IssueCommandArgs,
    project: &ResolvedProject,
    profile: &Profile,
    api: &dyn ApiClientFactory,
    title: String,
    description: Option<String>,
) -> anyhow::Result<String> {
    let issue = api.issues().create_issue(
        project.require_project()?,
        &CreateIssueOptions {
            title,
            description,
            assignee_id: args.write.assignee_or(profile.default_assignee_id),
            milestone_id: args.write.milestone_id,
        },
    )?;

    Ok(format!("Issue created at {}", issue.web_url))
}

fn update_issue(
    args: &IssueCommandArgs,
    project: &ResolvedProject,
    iid: u64,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let project = project.require_project()?;
    let current = api.issues().get_issue(project, iid)?;
    let options = changed_fields(
        &current,
        UpdateIssueOptions {
            title: args.write.title.clone(),
            description: args.write.message.clone(),
            assignee_id: args.write.assignee_id,
            milestone_id: args.write.milestone_id,
            state_event: args.write.state_event,
        },
    );

    if !options.is_empty() {
        api.issues().update_issue(project, iid, &options)?;
    }

    Ok(String::new())
}

fn update_issue_on_editor(
    project: &ResolvedProject,
    iid: u64,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let project = project.require_project()?;
    let current = api.issues().get_issue(project, iid)?;
    let message =
        io::prompt_with_text_editor(&shared::editor_text(&current.title, &current.description))?;
    let options = changed_fields(
        &current,
        UpdateIssueOptions {
            title: Some(message.title),
            description: Some(message.body),
            ..UpdateIssueOptions::default()
        },
    );

    if !options.is_empty() {
        api.issues().update_issue(project, iid, &options)?;
    }

    Ok(String::new())
}

/// Drops title and description when they equal the current ones.
fn changed_fields(current: &Issue, mut options: UpdateIssueOptions) -> UpdateIssueOptions {
    if options.title.as_deref() == Some(current.title.as_str()) {
        options.title = None;
    }

    if options.description.as_deref() == Some(current.description.as_str()) {
        options.description = None;
    }

    options
}
