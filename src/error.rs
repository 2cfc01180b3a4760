//! Error types shared by the commands.

use std::path::PathBuf;

use thiserror::Error;

/// Failures with a meaning of their own. Everything else travels as a plain
/// `anyhow::Error` with context attached.
#[derive(Debug, Error)]
pub enum LabError {
    /// `git remote` listed nothing.
    #[error("The git repository has no remotes")]
    NoRemotes,

    /// None of the remotes points at a host starting with `gitlab`.
    #[error("No GitLab remote found. The remote host must start with 'gitlab'")]
    NoGitlabRemote,

    /// Resolution finished without a domain.
    #[error(
        "Couldn't determine the GitLab domain. Run lab inside a GitLab repository, set default_profile in the config, or pass --profile"
    )]
    NoProfile,

    /// A named profile doesn't exist in the config file.
    #[error("Profile '{0}' not found in the config file")]
    ProfileNotFound(String),

    /// A repository argument that isn't `namespace/project`.
    #[error("Invalid repository '{0}'. Expected the format <namespace>/<project>")]
    InvalidRepository(String),

    /// A command needs a project but none was resolved.
    #[error("No project specified. Run lab inside a GitLab repository or pass --project")]
    NoProject,

    /// A local input file couldn't be read.
    #[error("Failed to read file '{}'", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// GitLab answered with a non-success status.
    #[error("GitLab API responded with {status}: {message}")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },
}

/// Maps an error to the process exit status: 2 for file errors, 1 otherwise.
pub fn exit_status_for(error: &anyhow::Error) -> u8 {
    let is_file_error = error
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<LabError>(), Some(LabError::FileRead { .. })));

    if is_file_error { 2 } else { 1 }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn test_file_errors_exit_with_two() {
        let error = anyhow::Error::new(LabError::FileRead {
            path: PathBuf::from(".gitlab-ci.yml"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        });

        assert_eq!(exit_status_for(&error), 2);
    }

    #[test]
    fn test_file_errors_behind_context_exit_with_two() {
        let result: anyhow::Result<()> = Err(LabError::FileRead {
            path: PathBuf::from("ci.yml"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        }
        .into());
        let error = result.context("Failed to lint").unwrap_err();

        assert_eq!(exit_status_for(&error), 2);
    }

    #[test]
    fn test_other_errors_exit_with_one() {
        let error = anyhow::Error::new(LabError::ProfileNotFound("gitlab.com".to_string()));

        assert_eq!(exit_status_for(&error), 1);
        assert_eq!(exit_status_for(&anyhow::anyhow!("boom")), 1);
    }
}
