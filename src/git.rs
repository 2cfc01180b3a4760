//! Git operations and utilities.

use std::{process::Command, sync::LazyLock};

use anyhow::Context;
use regex::Regex;

use crate::error::LabError;

/// Matches `ssh://git@<host>[:<port>]/<path>`, `https://<host>[:<port>]/<path>`
/// and `git@<host>:<path>`, with or without a trailing `.git`. A port is only
/// recognized after a scheme, the scp-like form has none.
static REMOTE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:[A-Za-z][A-Za-z0-9+.-]*://(?:[^@/]+@)?(?P<domain>[^:/]+)(?::\d+)?/|(?:[^@/:]+@)?(?P<scp_domain>[^:/]+):)(?P<path>[^/].*?)(?:\.git)?/?$",
    )
    .expect("remote URL pattern is valid")
});

/// A git remote whose URL points at a namespaced repository.
#[derive(Clone, Debug, PartialEq)]
pub struct RemoteInfo {
    /// The remote name (e.g., "origin").
    pub remote: String,
    /// The hostname (e.g., "gitlab.com").
    pub domain: String,
    /// The top-level group or user.
    pub namespace: String,
    /// Group path between namespace and repository, if any.
    pub subgroup: Option<String>,
    /// The repository name without `.git`.
    pub repository: String,
}

impl RemoteInfo {
    /// The project path as GitLab names it, e.g. `group/sub/repo`.
    pub fn project_path(&self) -> String {
        match &self.subgroup {
            Some(subgroup) => format!("{}/{}/{}", self.namespace, subgroup, self.repository),
            None => format!("{}/{}", self.namespace, self.repository),
        }
    }

    /// The domain followed by the project path.
    pub fn repository_url(&self) -> String {
        format!("{}/{}", self.domain, self.project_path())
    }
}

/// Lists all remotes of the current repository with parsable URLs.
///
/// # Errors
///
/// Returns an error if git can't be executed, fails, or lists no remotes.
pub fn list_remotes() -> anyhow::Result<Vec<RemoteInfo>> {
    collect_remotes(list_remote_names()?, get_remote_url)
}

/// Looks up and parses the URL of each named remote. Remotes with URLs that
/// don't name a repository are skipped.
fn collect_remotes<F>(names: Vec<String>, get_url: F) -> anyhow::Result<Vec<RemoteInfo>>
where
    F: Fn(&str) -> anyhow::Result<String>,
{
    if names.is_empty() {
        return Err(LabError::NoRemotes.into());
    }

    let mut remotes = Vec::with_capacity(names.len());

    for name in names {
        let url = get_url(&name)
            .with_context(|| format!("Failed to get URL for remote '{}'", name))?;

        match parse_remote_url(&name, &url) {
            Some(remote) => remotes.push(remote),
            None => tracing::debug!(remote = %name, %url, "skipping remote with unrecognized URL"),
        }
    }

    Ok(remotes)
}

fn list_remote_names() -> anyhow::Result<Vec<String>> {
    let output = Command::new("git")
        .arg("remote")
        .output()
        .context("Failed to execute git command to list remotes")?;

    if !output.status.success() {
        anyhow::bail!(
            "Git command failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Gets the URL for a git remote.
///
/// # Errors
///
/// Returns an error if git command fails; for instance if the remote doesn't
/// exist.
pub fn get_remote_url(remote: &str) -> anyhow::Result<String> {
    tracing::debug!(remote, "git remote get-url");

    let output = Command::new("git")
        .args(["remote", "get-url", remote])
        .output()
        .with_context(|| format!("Failed to execute git command for remote '{}'", remote))?;

    if !output.status.success() {
        anyhow::bail!(
            "Git command failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Whether the working directory is inside a git working tree. Any failure,
/// including a missing git binary, counts as "no".
pub fn is_inside_work_tree() -> bool {
    Command::new("git")
        .args(["rev-parse", "--is-inside-work-tree"])
        .output()
        .map(|output| {
            output.status.success() && String::from_utf8_lossy(&output.stdout).trim() == "true"
        })
        .unwrap_or(false)
}

/// Gets the name of the current git branch.
///
/// # Errors
///
/// Returns an error if the git operation fails or no branch is checked out.
pub fn get_current_branch() -> anyhow::Result<String> {
    let output = Command::new("git")
        .args(["branch", "--show-current"])
        .output()
        .context("Failed to execute git command to get current branch")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        anyhow::bail!("Failed to get current branch: {stderr}");
    }

    let branch = String::from_utf8_lossy(&output.stdout);
    let branch = branch.trim();

    if branch.is_empty() {
        anyhow::bail!("No branch checked out.");
    }

    Ok(branch.to_string())
}

/// Gets the default branch for a remote.
///
/// Checks the remote's HEAD ref first, then falls back to "main" or "master".
///
/// # Errors
///
/// Returns an error if we can't determine the default branch.
pub fn get_default_branch(remote: &str) -> anyhow::Result<String> {
    let output = Command::new("git")
        .args(["symbolic-ref", &format!("refs/remotes/{remote}/HEAD")])
        .output()
        .with_context(|| format!("Failed to get default branch for '{}'", remote))?;

    if output.status.success() {
        let ref_name = String::from_utf8_lossy(&output.stdout);

        if let Some(branch) = ref_name.trim().split('/').next_back() {
            return Ok(branch.to_string());
        }
    }

    for branch in ["main", "master"] {
        let output = Command::new("git")
            .args(["rev-parse", "--verify", &format!("{remote}/{branch}")])
            .output()
            .with_context(|| format!("Failed to verify branch '{remote}/{branch}'"))?;

        if output.status.success() {
            return Ok(branch.to_string());
        }
    }

    anyhow::bail!("Couldn't determine default branch")
}

/// Gets the absolute path of the git repository.
///
/// # Errors
///
/// Returns an error if the git command fails; e.g. if there is no working tree.
pub fn get_absolute_repo_root() -> anyhow::Result<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .output()
        .context("Failed to execute git-rev-parse")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);

        anyhow::bail!("Failed to find the repository root: {stderr}");
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Parses a git remote URL into a [`RemoteInfo`].
///
/// The path part needs at least two segments. With more, the first is the
/// namespace, the last the repository and everything between the subgroup.
pub fn parse_remote_url(remote: &str, url: &str) -> Option<RemoteInfo> {
    let captures = REMOTE_URL.captures(url.trim())?;
    let domain = captures
        .name("domain")
        .or_else(|| captures.name("scp_domain"))?
        .as_str();
    let segments: Vec<&str> = captures
        .name("path")?
        .as_str()
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    let (namespace, subgroup, repository) = match segments.as_slice() {
        [namespace, repository] => (*namespace, None, *repository),
        [namespace, middle @ .., repository] if !middle.is_empty() => {
            (*namespace, Some(middle.join("/")), *repository)
        }
        _ => return None,
    };

    Some(RemoteInfo {
        remote: remote.to_string(),
        domain: domain.to_string(),
        namespace: namespace.to_string(),
        subgroup,
        repository: repository.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remote(domain: &str, namespace: &str, subgroup: Option<&str>, repository: &str) -> RemoteInfo {
        RemoteInfo {
            remote: "origin".to_string(),
            domain: domain.to_string(),
            namespace: namespace.to_string(),
            subgroup: subgroup.map(str::to_string),
            repository: repository.to_string(),
        }
    }

    #[test]
    fn test_parse_remote_url_all_schemes_agree() {
        let expected = remote("gitlab.example.com", "group", None, "project");

        for url in [
            "ssh://git@gitlab.example.com/group/project.git",
            "git@gitlab.example.com:group/project.git",
            "https://gitlab.example.com/group/project",
            "https://gitlab.example.com/group/project.git",
        ] {
            assert_eq!(parse_remote_url("origin", url), Some(expected.clone()), "{url}");
        }
    }

    #[test]
    fn test_parse_remote_url_with_port() {
        let expected = remote("gitlab.example.com", "group", None, "project");

        assert_eq!(
            parse_remote_url("origin", "ssh://git@gitlab.example.com:2222/group/project.git"),
            Some(expected.clone())
        );
        assert_eq!(
            parse_remote_url("origin", "https://gitlab.example.com:8443/group/project"),
            Some(expected)
        );
    }

    #[test]
    fn test_parse_remote_url_subgroup() {
        let result = parse_remote_url("origin", "git@gitlab.example.com:group/sub/project.git");

        assert_eq!(
            result,
            Some(remote("gitlab.example.com", "group", Some("sub"), "project"))
        );

        let result = result.unwrap();

        assert_eq!(result.project_path(), "group/sub/project");
        assert_eq!(result.repository_url(), "gitlab.example.com/group/sub/project");
    }

    #[test]
    fn test_parse_remote_url_nested_subgroups() {
        let result = parse_remote_url("upstream", "https://gitlab.com/a/b/c/repo.git").unwrap();

        assert_eq!(result.remote, "upstream");
        assert_eq!(result.subgroup.as_deref(), Some("b/c"));
        assert_eq!(result.project_path(), "a/b/c/repo");
    }

    #[test]
    fn test_parse_remote_url_without_subgroup_joins_two_segments() {
        let result = parse_remote_url("origin", "git@gitlab.com:user/repo.git").unwrap();

        assert_eq!(result.repository_url(), "gitlab.com/user/repo");
    }

    #[test]
    fn test_parse_remote_url_rejects_unknown_formats() {
        assert_eq!(parse_remote_url("origin", "/srv/git/repo.git"), None);
        assert_eq!(parse_remote_url("origin", "file:///srv/git/repo.git"), None);
        assert_eq!(parse_remote_url("origin", "https://gitlab.com/repo"), None);
        assert_eq!(parse_remote_url("origin", ""), None);
    }

    #[test]
    fn test_parse_remote_url_numeric_namespace_is_not_a_port() {
        assert_eq!(
            parse_remote_url("origin", "git@gitlab.example.com:1234/repo.git"),
            Some(remote("gitlab.example.com", "1234", None, "repo"))
        );
        assert_eq!(
            parse_remote_url("origin", "ssh://git@gitlab.example.com:1234/group/repo.git"),
            Some(remote("gitlab.example.com", "group", None, "repo"))
        );
    }

    #[test]
    fn test_collect_remotes_without_remotes() {
        let err = collect_remotes(Vec::new(), |_| -> anyhow::Result<String> {
            panic!("no URL lookup expected")
        })
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<LabError>(),
            Some(LabError::NoRemotes)
        ));
    }

    #[test]
    fn test_collect_remotes_skips_unparsable_urls() {
        let names = vec!["origin".to_string(), "local".to_string()];
        let remotes = collect_remotes(names, |name| {
            Ok(match name {
                "origin" => "git@gitlab.example.com:group/project.git".to_string(),
                _ => "/srv/git/project.git".to_string(),
            })
        })
        .unwrap();

        assert_eq!(
            remotes,
            vec![remote("gitlab.example.com", "group", None, "project")]
        );
    }
}
