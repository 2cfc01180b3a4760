//! The `browse` subcommand.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;

use crate::{
    cli::{resolve::ResolvedProject, session::Session},
    git,
    io::{self, UrlAction},
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Command-line arguments for the `browse` subcommand.
#[derive(Args, Debug, Default)]
pub struct BrowseCommandArgs {
    /// The file or directory to open. Opens the project page without it
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Instead of opening the URL in your browser, print it to stdout
    #[arg(short, long, group = "url_action")]
    pub url: bool,

    /// Copy the URL to the clipboard
    #[arg(short, long, group = "url_action")]
    pub copy: bool,
}

impl BrowseCommandArgs {
    fn action(&self) -> UrlAction {
        if self.url {
            UrlAction::Print
        } else if self.copy {
            UrlAction::Copy
        } else {
            UrlAction::Open
        }
    }
}

// =============================================================================
// Command Logic
// =============================================================================

/// Execute the `browse` subcommand and either opens a project link in the
/// browser, prints it or copies it.
pub fn browse_project(args: BrowseCommandArgs, session: &Session) -> anyhow::Result<()> {
    let project = &session.project;

    project.require_project()?;

    let url = match args.path.as_deref() {
        Some(path) => browse_path_url(project, path)?,
        None => project.web_url(),
    };

    io::deliver_url(&url, args.action())
}

// =============================================================================
// Private Helpers
// =============================================================================

fn browse_path_url(project: &ResolvedProject, path: &str) -> anyhow::Result<String> {
    let path_buf = PathBuf::from(path)
        .canonicalize()
        .with_context(|| format!("Failed to canonicalize the given file path: {path}"))?;
    let repo_root = git::get_absolute_repo_root()?;
    let relative_path = path_buf
        .strip_prefix(&repo_root)
        .with_context(|| format!("{path} is not inside the repository at {repo_root}"))?;
    let branch = git::get_current_branch().context("Failed to get the current branch")?;

    Ok(path_url(
        project,
        &branch,
        &path_with_forward_slashes(relative_path),
        path_buf.is_dir(),
    ))
}

fn path_url(project: &ResolvedProject, branch: &str, relative_path: &str, is_dir: bool) -> String {
    let kind = if is_dir { "tree" } else { "blob" };

    if relative_path.is_empty() {
        return format!("{}/-/tree/{branch}", project.web_url());
    }

    format!("{}/-/{kind}/{branch}/{relative_path}", project.web_url())
}

fn path_with_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> ResolvedProject {
        ResolvedProject {
            domain: "gitlab.example.com".to_string(),
            project: "group/app".to_string(),
            token: "token".to_string(),
        }
    }

    #[test]
    fn test_file_url() {
        assert_eq!(
            path_url(&project(), "main", "src/lib.rs", false),
            "https://gitlab.example.com/group/app/-/blob/main/src/lib.rs"
        );
    }

    #[test]
    fn test_directory_url() {
        assert_eq!(
            path_url(&project(), "feature/x", "src", true),
            "https://gitlab.example.com/group/app/-/tree/feature/x/src"
        );
    }

    #[test]
    fn test_repository_root_url() {
        assert_eq!(
            path_url(&project(), "main", "", true),
            "https://gitlab.example.com/group/app/-/tree/main"
        );
    }

    #[test]
    fn test_path_with_forward_slashes() {
        let path: PathBuf = ["src", "cli", "browse.rs"].iter().collect();

        assert_eq!(path_with_forward_slashes(&path), "src/cli/browse.rs");
    }

    #[test]
    fn test_default_action_opens_browser() {
        assert_eq!(BrowseCommandArgs::default().action(), UrlAction::Open);
        assert_eq!(
            BrowseCommandArgs {
                copy: true,
                ..BrowseCommandArgs::default()
            }
            .action(),
            UrlAction::Copy
        );
    }
}
