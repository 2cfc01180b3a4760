//! Arguments and helpers shared by the subcommands.

use clap::Args;
use serde::Serialize;

use crate::{
    cli::gitlab::{ApiClientFactory, Note, OrderBy, Scope, Sort, StateEvent},
    io::{self, OutputFormat, UrlAction},
};

pub const DEFAULT_PER_PAGE: u32 = 20;

// =============================================================================
// CLI Arguments
// =============================================================================

/// Flags that open, print or copy a web page instead of calling the API.
#[derive(Args, Debug, Default)]
pub struct BrowseArgs {
    /// Open the page in the web browser
    #[arg(short, long, group = "browse_action")]
    pub browse: bool,

    /// Print the URL of the page
    #[arg(short, long, group = "browse_action")]
    pub url: bool,

    /// Copy the URL of the page to the clipboard
    #[arg(short, long, group = "browse_action")]
    pub copy: bool,
}

impl BrowseArgs {
    pub fn action(&self) -> Option<UrlAction> {
        if self.browse {
            Some(UrlAction::Open)
        } else if self.url {
            Some(UrlAction::Print)
        } else if self.copy {
            Some(UrlAction::Copy)
        } else {
            None
        }
    }
}

/// Paging and output options of list commands.
#[derive(Args, Debug)]
pub struct PageArgs {
    /// Number of items to list
    #[arg(short = 'n', long = "num", default_value_t = DEFAULT_PER_PAGE, value_name = "NUMBER")]
    pub num: u32,

    /// Page number to fetch
    #[arg(long, default_value_t = 1, value_name = "NUMBER")]
    pub page: u32,

    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

impl Default for PageArgs {
    fn default() -> Self {
        PageArgs {
            num: DEFAULT_PER_PAGE,
            page: 1,
            format: OutputFormat::Table,
        }
    }
}

/// Filters of the issue and merge request lists.
#[derive(Args, Debug, Default)]
pub struct ListArgs {
    #[command(flatten)]
    pub pages: PageArgs,

    /// Filter by scope
    #[arg(long)]
    pub scope: Option<Scope>,

    /// Order by this field
    #[arg(long = "orderby", value_name = "FIELD")]
    pub order_by: Option<OrderBy>,

    /// Sort order
    #[arg(long)]
    pub sort: Option<Sort>,

    /// Search in titles and descriptions
    #[arg(short, long, value_name = "TEXT")]
    pub search: Option<String>,
}

/// Flags that create or update an issue or merge request.
#[derive(Args, Debug, Default)]
pub struct WriteArgs {
    /// Write the title and description in your text editor
    #[arg(short = 'e', long = "edit")]
    pub editor: bool,

    /// Title
    #[arg(short = 'i', long)]
    pub title: Option<String>,

    /// Description. Without --title, its first line becomes the title
    #[arg(short, long)]
    pub message: Option<String>,

    /// Start the editor with this template from the repository
    #[arg(long, value_name = "NAME", requires = "editor")]
    pub template: Option<String>,

    /// List the templates available in the repository
    #[arg(long)]
    pub list_template: bool,

    /// Assign this user
    #[arg(long = "cu-assignee-id", value_name = "ID")]
    pub assignee_id: Option<u64>,

    /// Set this milestone
    #[arg(long = "cu-milestone-id", value_name = "ID")]
    pub milestone_id: Option<u64>,

    /// Close or reopen
    #[arg(long)]
    pub state_event: Option<StateEvent>,
}

impl WriteArgs {
    /// Whether any field to write was given on the command line.
    pub fn has_fields(&self) -> bool {
        self.title.is_some()
            || self.message.is_some()
            || self.assignee_id.is_some()
            || self.milestone_id.is_some()
            || self.state_event.is_some()
    }

    /// Title and description from `--title` and `--message`.
    pub fn title_and_description(&self) -> anyhow::Result<(String, Option<String>)> {
        match (&self.title, &self.message) {
            (Some(title), message) => Ok((title.clone(), message.clone())),
            (None, Some(message)) => {
                let (title, body) = split_message(message);

                if title.is_empty() {
                    anyhow::bail!("The title is empty. Pass --title or a non-empty --message");
                }

                Ok((title, (!body.is_empty()).then_some(body)))
            }
            (None, None) => anyhow::bail!("A title is required. Pass --title or --message"),
        }
    }

    /// `--cu-assignee-id`, falling back to the profile's default assignee.
    pub fn assignee_or(&self, default_assignee_id: u64) -> Option<u64> {
        self.assignee_id
            .or((default_assignee_id != 0).then_some(default_assignee_id))
    }
}

// =============================================================================
// Domain Types
// =============================================================================

/// What an `issue` or `merge-request` invocation does.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mode {
    Browse(UrlAction),
    UpdateOnEditor(u64),
    Update(u64),
    Show(u64),
    CreateOnEditor,
    Create,
    ListTemplates,
    ListAll,
    ListMine,
    List,
}

/// The inputs that decide the [`Mode`].
#[derive(Debug, Default)]
pub struct ModeInputs {
    pub iid: Option<u64>,
    pub browse: Option<UrlAction>,
    pub editor: bool,
    pub has_fields: bool,
    pub list_templates: bool,
    pub all_projects: bool,
    pub mine: bool,
}

/// Picks exactly one mode. Browsing comes first. With an IID the order is
/// update on editor, update, show. Without one it is create on editor,
/// create, list templates, list across projects, list mine, list.
pub fn select_mode(inputs: &ModeInputs) -> Mode {
    if let Some(action) = inputs.browse {
        return Mode::Browse(action);
    }

    match inputs.iid {
        Some(iid) if inputs.editor => Mode::UpdateOnEditor(iid),
        Some(iid) if inputs.has_fields => Mode::Update(iid),
        Some(iid) => Mode::Show(iid),
        None if inputs.editor => Mode::CreateOnEditor,
        None if inputs.has_fields => Mode::Create,
        None if inputs.list_templates => Mode::ListTemplates,
        None if inputs.all_projects => Mode::ListAll,
        None if inputs.mine => Mode::ListMine,
        None => Mode::List,
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Splits a message into the first line and the rest.
pub fn split_message(message: &str) -> (String, String) {
    match message.trim_start().split_once('\n') {
        Some((title, body)) => (title.trim().to_string(), body.trim().to_string()),
        None => (message.trim().to_string(), String::new()),
    }
}

/// Editor text for changing an existing title and description.
pub fn editor_text(title: &str, description: &str) -> String {
    if description.is_empty() {
        title.to_string()
    } else {
        format!("{title}\n\n{description}")
    }
}

/// Names of the markdown templates in `directory` of the repository.
pub fn list_templates(
    api: &dyn ApiClientFactory,
    project: &str,
    directory: &str,
) -> anyhow::Result<Vec<String>> {
    let entries = api.repository().list_tree(project, directory, None)?;

    Ok(entries
        .into_iter()
        .filter(|entry| entry.kind == "blob")
        .filter_map(|entry| entry.name.strip_suffix(".md").map(str::to_string))
        .collect())
}

/// The content of template `name` from `directory` of the repository.
pub fn load_template(
    api: &dyn ApiClientFactory,
    project: &str,
    directory: &str,
    name: &str,
) -> anyhow::Result<String> {
    api.repository()
        .get_raw_file(project, &format!("{directory}/{name}.md"), None)
}

/// Renders user comments below a detail view. System notes are skipped.
pub fn format_notes(notes: &[Note]) -> String {
    notes
        .iter()
        .filter(|note| !note.system)
        .map(|note| {
            format!(
                "\n--\n{} ({}):\n{}\n",
                note.author,
                note.created_at,
                note.body.trim()
            )
        })
        .collect()
}

/// Formats a list for output. `fields` selects the columns, falling back to
/// `default_fields`. JSON keeps every field unless some were selected.
pub fn format_list<T, F>(
    items: &[T],
    fields: &[F],
    default_fields: &[F],
    format: &OutputFormat,
) -> anyhow::Result<String>
where
    T: Serialize,
    F: Serialize,
{
    let fields: &[F] = match (format, fields.is_empty()) {
        (OutputFormat::Json, true) => &[],
        (_, true) => default_fields,
        (_, false) => fields,
    };

    io::format(items, fields, format)
}

pub fn print_output(output: &str) {
    if !output.is_empty() {
        println!("{output}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::gitlab::{TreeEntry, fake::FakeGitLab};

    fn inputs() -> ModeInputs {
        ModeInputs::default()
    }

    // =========================================================================
    // Mode selection
    // =========================================================================

    #[test]
    fn test_browse_beats_everything() {
        let mode = select_mode(&ModeInputs {
            iid: Some(3),
            browse: Some(UrlAction::Print),
            editor: true,
            has_fields: true,
            ..inputs()
        });

        assert_eq!(mode, Mode::Browse(UrlAction::Print));
    }

    #[test]
    fn test_modes_with_iid() {
        let with_iid = || ModeInputs {
            iid: Some(3),
            ..inputs()
        };

        assert_eq!(
            select_mode(&ModeInputs {
                editor: true,
                has_fields: true,
                ..with_iid()
            }),
            Mode::UpdateOnEditor(3)
        );
        assert_eq!(
            select_mode(&ModeInputs {
                has_fields: true,
                all_projects: true,
                ..with_iid()
            }),
            Mode::Update(3)
        );
        assert_eq!(
            select_mode(&ModeInputs {
                mine: true,
                ..with_iid()
            }),
            Mode::Show(3)
        );
    }

    #[test]
    fn test_modes_without_iid() {
        assert_eq!(
            select_mode(&ModeInputs {
                editor: true,
                has_fields: true,
                ..inputs()
            }),
            Mode::CreateOnEditor
        );
        assert_eq!(
            select_mode(&ModeInputs {
                has_fields: true,
                all_projects: true,
                ..inputs()
            }),
            Mode::Create
        );
        assert_eq!(
            select_mode(&ModeInputs {
                list_templates: true,
                all_projects: true,
                ..inputs()
            }),
            Mode::ListTemplates
        );
        assert_eq!(
            select_mode(&ModeInputs {
                all_projects: true,
                mine: true,
                ..inputs()
            }),
            Mode::ListAll
        );
        assert_eq!(
            select_mode(&ModeInputs {
                mine: true,
                ..inputs()
            }),
            Mode::ListMine
        );
        assert_eq!(select_mode(&inputs()), Mode::List);
    }

    // =========================================================================
    // Write arguments
    // =========================================================================

    #[test]
    fn test_title_from_message_first_line() {
        let args = WriteArgs {
            message: Some("Crash on start\n\nSteps to reproduce".to_string()),
            ..WriteArgs::default()
        };

        assert_eq!(
            args.title_and_description().unwrap(),
            (
                "Crash on start".to_string(),
                Some("Steps to reproduce".to_string())
            )
        );
    }

    #[test]
    fn test_explicit_title_keeps_whole_message() {
        let args = WriteArgs {
            title: Some("Crash".to_string()),
            message: Some("line one\nline two".to_string()),
            ..WriteArgs::default()
        };

        assert_eq!(
            args.title_and_description().unwrap(),
            ("Crash".to_string(), Some("line one\nline two".to_string()))
        );
        assert!(WriteArgs::default().title_and_description().is_err());
    }

    #[test]
    fn test_assignee_falls_back_to_profile_default() {
        let explicit = WriteArgs {
            assignee_id: Some(5),
            ..WriteArgs::default()
        };

        assert_eq!(explicit.assignee_or(42), Some(5));
        assert_eq!(WriteArgs::default().assignee_or(42), Some(42));
        assert_eq!(WriteArgs::default().assignee_or(0), None);
    }

    // =========================================================================
    // Templates and notes
    // =========================================================================

    #[test]
    fn test_list_templates_keeps_markdown_files() {
        let entry = |name: &str, kind: &str| TreeEntry {
            id: String::new(),
            name: name.to_string(),
            kind: kind.to_string(),
            path: format!(".gitlab/issue_templates/{name}"),
        };
        let fake = FakeGitLab {
            tree: vec![
                entry("Bug.md", "blob"),
                entry("Feature.md", "blob"),
                entry("notes.txt", "blob"),
                entry("drafts", "tree"),
            ],
            ..FakeGitLab::default()
        };

        assert_eq!(
            list_templates(&fake, "group/app", ".gitlab/issue_templates").unwrap(),
            vec!["Bug", "Feature"]
        );
    }

    #[test]
    fn test_load_template_reads_markdown_file() {
        let mut fake = FakeGitLab::default();

        fake.files.insert(
            ".gitlab/issue_templates/Bug.md".to_string(),
            "## Steps".to_string(),
        );

        assert_eq!(
            load_template(&fake, "group/app", ".gitlab/issue_templates", "Bug").unwrap(),
            "## Steps"
        );
        assert!(load_template(&fake, "group/app", ".gitlab/issue_templates", "Nope").is_err());
    }

    #[test]
    fn test_format_notes_skips_system_notes() {
        let notes = vec![
            Note {
                id: 1,
                author: "bob".to_string(),
                body: "assigned to @alice".to_string(),
                system: true,
                created_at: "2024-01-01".to_string(),
            },
            Note {
                id: 2,
                author: "alice".to_string(),
                body: "On it\n".to_string(),
                system: false,
                created_at: "2024-01-02".to_string(),
            },
        ];

        assert_eq!(format_notes(&notes), "\n--\nalice (2024-01-02):\nOn it\n");
    }
}
