//! The `lint` subcommand.

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::Args;

use crate::{
    cli::{
        gitlab::{ApiClientFactory, LintResult},
        session::Session,
    },
    error::LabError,
};

const DEFAULT_CI_FILE: &str = ".gitlab-ci.yml";

/// Command-line arguments for the `lint` subcommand.
#[derive(Args, Debug)]
pub struct LintCommandArgs {
    /// The CI configuration to validate
    #[arg(value_name = "FILE", default_value = DEFAULT_CI_FILE)]
    pub file: PathBuf,
}

/// Execute the `lint` subcommand. The file is read before `open_session`
/// runs, so a missing file fails without resolving a profile.
pub fn run_lint<F>(args: LintCommandArgs, open_session: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<Session>,
{
    let content = read_ci_file(&args.file)?;
    let session = open_session()?;
    let output = lint(&content, session.project.require_project()?, session.api())?;

    println!("{output}");

    Ok(())
}

fn read_ci_file(path: &Path) -> Result<String, LabError> {
    fs::read_to_string(path).map_err(|source| LabError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Validates `content` and fails with the report when it's invalid.
fn lint(content: &str, project: &str, api: &dyn ApiClientFactory) -> anyhow::Result<String> {
    let result = api.lint().lint(project, content)?;

    tracing::debug!(valid = result.valid, "linted CI configuration");

    if !result.valid {
        anyhow::bail!(format_report(&result));
    }

    Ok(format_report(&result))
}

fn format_report(result: &LintResult) -> String {
    let mut lines = Vec::new();

    if result.valid {
        lines.push("Syntax is correct".to_string());
    }

    lines.extend(result.errors.iter().map(|error| format!("error: {error}")));
    lines.extend(
        result
            .warnings
            .iter()
            .map(|warning| format!("warning: {warning}")),
    );

    lines.join("\n")
}
