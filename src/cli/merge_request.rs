//! The `merge-request` subcommand.

use anyhow::Context;
use clap::{Args, ValueEnum};
use serde::Serialize;

use crate::{
    cli::{
        config::Profile,
        gitlab::{
            ApiClientFactory, CreateMergeRequestOptions, ListMergeRequestsOptions, MergeRequest,
            MergeRequestState, Scope, UpdateMergeRequestOptions,
        },
        resolve::ResolvedProject,
        session::Session,
        shared::{self, BrowseArgs, ListArgs, Mode, ModeInputs, WriteArgs},
    },
    git,
    io,
};

const TEMPLATE_DIR: &str = ".gitlab/merge_request_templates";
const DEFAULT_REMOTE: &str = "origin";

// =============================================================================
// CLI Arguments
// =============================================================================

/// Command-line arguments for the `merge-request` subcommand.
#[derive(Args, Debug, Default)]
pub struct MergeRequestCommandArgs {
    /// Merge request IID. Shows or updates that merge request; lists or
    /// creates merge requests without it
    #[arg(value_name = "IID")]
    pub iid: Option<u64>,

    #[command(flatten)]
    pub browse: BrowseArgs,

    #[command(flatten)]
    pub write: WriteArgs,

    #[command(flatten)]
    pub list: ListArgs,

    /// Source branch [default: the current branch]
    #[arg(long, value_name = "BRANCH")]
    pub source: Option<String>,

    /// Target branch [default: the remote's default branch]
    #[arg(long, value_name = "BRANCH")]
    pub target: Option<String>,

    /// Filter by state [default: opened]
    #[arg(long)]
    pub state: Option<MergeRequestState>,

    /// List merge requests of all projects
    #[arg(short = 'A', long)]
    pub all_project: bool,

    /// List merge requests assigned to you
    #[arg(long)]
    pub mine: bool,

    /// Show the comments as well
    #[arg(long)]
    pub comment: bool,

    /// Fields to include in list output (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub fields: Vec<MergeRequestField>,
}

// =============================================================================
// Domain Types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum MergeRequestField {
    Iid,
    Reference,
    Title,
    State,
    Author,
    Assignee,
    Milestone,
    Labels,
    SourceBranch,
    TargetBranch,
    Draft,
    MergeStatus,
    CreatedAt,
    UpdatedAt,
    WebUrl,
}

// =============================================================================
// Command Logic
// =============================================================================

/// Execute the `merge-request` subcommand.
pub fn run_merge_request(args: MergeRequestCommandArgs, session: &Session) -> anyhow::Result<()> {
    let output = merge_request(&args, &session.project, &session.profile(), session.api())?;

    shared::print_output(&output);

    Ok(())
}

fn merge_request(
    args: &MergeRequestCommandArgs,
    project: &ResolvedProject,
    profile: &Profile,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let mode = shared::select_mode(&ModeInputs {
        iid: args.iid,
        browse: args.browse.action(),
        editor: args.write.editor,
        has_fields: args.write.has_fields() || args.source.is_some() || args.target.is_some(),
        list_templates: args.write.list_template,
        all_projects: args.all_project,
        mine: args.mine,
    });

    tracing::debug!(?mode, "merge request");

    match mode {
        Mode::Browse(action) => {
            io::deliver_url(&merge_request_url(project, args.iid)?, action)?;

            Ok(String::new())
        }
        Mode::UpdateOnEditor(iid) => update_merge_request_on_editor(project, iid, api),
        Mode::Update(iid) => update_merge_request(args, project, iid, api),
        Mode::Show(iid) => show_merge_request(project, iid, args.comment, api),
        Mode::CreateOnEditor => create_merge_request_on_editor(args, project, profile, api),
        Mode::Create => create_merge_request(args, project, profile, api),
        Mode::ListTemplates => {
            let templates = shared::list_templates(api, project.require_project()?, TEMPLATE_DIR)?;

            Ok(templates.join("\n"))
        }
        Mode::ListAll => {
            let mrs = api
                .merge_requests()
                .list_all_merge_requests(&list_options(args, None))?;

            shared::format_list(
                &mrs,
                &args.fields,
                &[MergeRequestField::Reference, MergeRequestField::Title],
                &args.list.pages.format,
            )
        }
        Mode::ListMine => {
            let mrs = api.merge_requests().list_project_merge_requests(
                project.require_project()?,
                &list_options(args, Some(Scope::AssignedToMe)),
            )?;

            shared::format_list(
                &mrs,
                &args.fields,
                &[MergeRequestField::Iid, MergeRequestField::Title],
                &args.list.pages.format,
            )
        }
        Mode::List => {
            let mrs = api
                .merge_requests()
                .list_project_merge_requests(project.require_project()?, &list_options(args, None))?;

            shared::format_list(
                &mrs,
                &args.fields,
                &[MergeRequestField::Iid, MergeRequestField::Title],
                &args.list.pages.format,
            )
        }
    }
}

// =============================================================================
// Private Helpers
// =============================================================================

fn merge_request_url(project: &ResolvedProject, iid: Option<u64>) -> anyhow::Result<String> {
    project.require_project()?;

    Ok(match iid {
        Some(iid) => format!("{}/-/merge_requests/{iid}", project.web_url()),
        None => format!("{}/-/merge_requests", project.web_url()),
    })
}

fn list_options(args: &MergeRequestCommandArgs, scope: Option<Scope>) -> ListMergeRequestsOptions {
    ListMergeRequestsOptions {
        state: Some(args.state.unwrap_or(MergeRequestState::Opened)),
        scope: scope.or(args.list.scope),
        order_by: args.list.order_by,
        sort: args.list.sort,
        search: args.list.search.clone(),
        page: args.list.pages.page,
        per_page: args.list.pages.num,
    }
}

fn show_merge_request(
    project: &ResolvedProject,
    iid: u64,
    with_comments: bool,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let project = project.require_project()?;
    let mr = api.merge_requests().get_merge_request(project, iid)?;
    let mut output = format_merge_request_detail(&mr);

    if with_comments {
        output.push_str(&shared::format_notes(
            &api.notes().list_merge_request_notes(project, iid)?,
        ));
    }

    Ok(output.trim_end().to_string())
}

fn format_merge_request_detail(mr: &MergeRequest) -> String {
    format!(
        "!{} {}\n\
         --\n\
         state:     {}{}\n\
         author:    {}\n\
         assignee:  {}\n\
         milestone: {}\n\
         labels:    {}\n\
         branches:  {} -> {}\n\
         status:    {}\n\
         created:   {}\n\
         updated:   {}\n\
         url:       {}\n\
         \n\
         {}\n",
        mr.iid,
        mr.title,
        mr.state,
        if mr.draft { " (draft)" } else { "" },
        mr.author,
        mr.assignee,
        mr.milestone,
        mr.labels.join(", "),
        mr.source_branch,
        mr.target_branch,
        mr.merge_status,
        mr.created_at,
        mr.updated_at,
        mr.web_url,
        mr.description,
    )
}

/// Source and target branch, filling in what wasn't given from git.
fn branches(args: &MergeRequestCommandArgs) -> anyhow::Result<(String, String)> {
    let source = match &args.source {
        Some(source) => source.clone(),
        None => git::get_current_branch()
            .context("Couldn't determine the source branch. You can provide --source explicitly.")?,
    };
    let target = match &args.target {
        Some(target) => target.clone(),
        None => git::get_default_branch(DEFAULT_REMOTE)
            .context("Couldn't determine the target branch. You can provide --target explicitly.")?,
    };

    if source == target {
        anyhow::bail!(
            "Cannot create a merge request: source branch \"{source}\" is the same as the target branch."
        );
    }

    Ok((source, target))
}

fn create_merge_request(
    args: &MergeRequestCommandArgs,
    project: &ResolvedProject,
    profile: &Profile,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let (source, target) = branches(args)?;
    let (title, description) = if args.write.title.is_none() && args.write.message.is_none() {
        (source.clone(), None)
    } else {
        args.write.title_and_description()?
    };

    submit_merge_request(args, project, profile, api, (source, target), title, description)
}

fn create_merge_request_on_editor(
    args: &MergeRequestCommandArgs,
    project: &ResolvedProject,
    profile: &Profile,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let branches = branches(args)?;
    let initial = match &args.write.template {
        Some(name) => shared::load_template(api, project.require_project()?, TEMPLATE_DIR, name)?,
        None => String::new(),
    };
    let message = io::prompt_with_text_editor(&initial)?;
    let description = (!message.body.is_empty()).then_some(message.body);

    submit_merge_request(args, project, profile, api, branches, message.title, description)
}

fn submit_merge_request(
    args: &MergeRequestCommandArgs,
    project: &ResolvedProject,
    profile: &Profile,
    api: &dyn ApiClientFactory,
    (source_branch, target_branch): (String, String),
    title: String,
    description: Option<String>,
) -> anyhow::Result<String> {
    let mr = api.merge_requests().create_merge_request(
        project.require_project()?,
        &CreateMergeRequestOptions {
            source_branch,
            target_branch,
            title,
            description,
            assignee_id: args.write.assignee_or(profile.default_assignee_id),
            milestone_id: args.write.milestone_id,
        },
    )?;

    Ok(format!("Merge request created at {}", mr.web_url))
}

fn update_merge_request(
    args: &MergeRequestCommandArgs,
    project: &ResolvedProject,
    iid: u64,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let project = project.require_project()?;
    let current = api.merge_requests().get_merge_request(project, iid)?;
    let options = changed_fields(
        &current,
        UpdateMergeRequestOptions {
            title: args.write.title.clone(),
            description: args.write.message.clone(),
            target_branch: args.target.clone(),
            assignee_id: args.write.assignee_id,
            milestone_id: args.write.milestone_id,
            state_event: args.write.state_event,
        },
    );

    if !options.is_empty() {
        api.merge_requests()
            .update_merge_request(project, iid, &options)?;
    }

    Ok(String::new())
}

fn update_merge_request_on_editor(
    project: &ResolvedProject,
    iid: u64,
    api: &dyn ApiClientFactory,
) -> anyhow::Result<String> {
    let project = project.require_project()?;
    let current = api.merge_requests().get_merge_request(project, iid)?;
    let message =
        io::prompt_with_text_editor(&shared::editor_text(&current.title, &current.description))?;
    let options = changed_fields(
        &current,
        UpdateMergeRequestOptions {
            title: Some(message.title),
            description: Some(message.body),
            ..UpdateMergeRequestOptions::default()
        },
    );

    if !options.is_empty() {
        api.merge_requests()
            .update_merge_request(project, iid, &options)?;
    }

    Ok(String::new())
}

/// Drops fields that equal the current values.
fn changed_fields(
    current: &MergeRequest,
    mut options: UpdateMergeRequestOptions,
) -> UpdateMergeRequestOptions {
    if options.title.as_deref() == Some(current.title.as_str()) {
        options.title = None;
    }

    if options.description.as_deref() == Some(current.description.as_str()) {
        options.description = None;
    }

    if options.target_branch.as_deref() == Some(current.target_branch.as_str()) {
        options.target_branch = None;
    }

    options
}
