//! Works out which GitLab domain, project and token a command talks to.
//!
//! Three stages run in order, each overriding what the previous one found:
//!
//! 1. the default profile from the config file
//! 2. the GitLab remote of the current repository, if there is one
//! 3. `--profile` and `--project` given on the command line

use std::io::{BufRead, IsTerminal};

use anyhow::Context;
use dialoguer::Password;

use crate::{
    cli::config::{Config, ConfigStore, Profile},
    error::LabError,
    git::{self, RemoteInfo},
};

const GITLAB_DOMAIN_PREFIX: &str = "gitlab";
const PREFERRED_REMOTE: &str = "origin";

/// The domain, project and token a command uses to call the API.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolvedProject {
    pub domain: String,
    /// `namespace[/subgroup]/repository`, may be empty.
    pub project: String,
    pub token: String,
}

impl ResolvedProject {
    pub fn api_url(&self) -> String {
        format!("https://{}/api/v4", self.domain)
    }

    /// The project's home page.
    pub fn web_url(&self) -> String {
        format!("https://{}/{}", self.domain, self.project)
    }

    /// The project path, for commands that can't work without one.
    pub fn require_project(&self) -> Result<&str, LabError> {
        if self.project.is_empty() {
            return Err(LabError::NoProject);
        }

        Ok(&self.project)
    }
}

/// Overrides from the command line.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResolveOptions {
    /// Domain of the profile to use.
    pub profile: Option<String>,
    pub project: Option<String>,
}

/// Asks the user for the access token of a domain.
pub trait TokenPrompt {
    fn prompt_token(&self, domain: &str) -> anyhow::Result<String>;
}

/// Reads the token from stdin, hiding the input when stdin is a terminal.
pub struct StdinTokenPrompt;

impl TokenPrompt for StdinTokenPrompt {
    fn prompt_token(&self, domain: &str) -> anyhow::Result<String> {
        let prompt = format!("Enter the access token for {domain}");
        let token = if std::io::stdin().is_terminal() {
            Password::new()
                .with_prompt(&prompt)
                .interact()
                .context("Failed to read the access token")?
        } else {
            eprintln!("{prompt}:");

            let mut line = String::new();

            std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read the access token from stdin")?;

            line
        };
        let token = token.trim().to_string();

        if token.is_empty() {
            anyhow::bail!("Aborting: No access token entered for {domain}");
        }

        Ok(token)
    }
}

/// The remotes of the current repository, or `None` outside a repository.
pub fn local_remotes() -> anyhow::Result<Option<Vec<RemoteInfo>>> {
    if !git::is_inside_work_tree() {
        tracing::debug!("not inside a git work tree");

        return Ok(None);
    }

    git::list_remotes()
        .map(Some)
        .context("Failed to read the git remotes")
}

/// Runs all resolution stages. `remotes` is `None` outside a git repository.
/// Newly seen domains and entered tokens are saved to `store`.
///
/// # Errors
///
/// Fails if a stage fails or no domain could be determined.
pub fn resolve_project(
    store: &mut ConfigStore,
    remotes: Option<&[RemoteInfo]>,
    prompt: &dyn TokenPrompt,
    options: &ResolveOptions,
) -> anyhow::Result<ResolvedProject> {
    let resolved = apply_default_profile(ResolvedProject::default(), &store.config);
    let resolved = match remotes {
        Some(remotes) => apply_local_repository(resolved, store, remotes, prompt)?,
        None => resolved,
    };
    let resolved = apply_explicit_args(resolved, &store.config, options)?;

    if resolved.domain.is_empty() {
        return Err(LabError::NoProfile.into());
    }

    tracing::debug!(domain = %resolved.domain, project = %resolved.project, "resolved project");

    Ok(resolved)
}

fn apply_default_profile(mut resolved: ResolvedProject, config: &Config) -> ResolvedProject {
    if config.default_profile.is_empty() {
        return resolved;
    }

    let Ok(profile) = config.get_profile(&config.default_profile) else {
        tracing::warn!(
            domain = %config.default_profile,
            "default_profile has no matching profile, ignoring it"
        );

        return resolved;
    };

    tracing::debug!(domain = %config.default_profile, "using the default profile");

    resolved.domain = config.default_profile.clone();
    resolved.token = profile.token.clone();

    if !profile.default_project.is_empty() {
        resolved.project = profile.default_project.clone();
    }

    resolved
}

fn apply_local_repository(
    _resolved: ResolvedProject,
    store: &mut ConfigStore,
    remotes: &[RemoteInfo],
    prompt: &dyn TokenPrompt,
) -> anyhow::Result<ResolvedProject> {
    let target = select_target_remote(remotes)?;
    let domain = target.domain.as_str();

    tracing::debug!(
        remote = %target.remote,
        repository = %target.repository_url(),
        "using the repository remote"
    );

    if !store.config.has_domain(domain) {
        store.config.set_profile(domain, Profile::default());
        store.save()?;

        eprintln!(
            "Added a profile for {domain} to {}",
            store.path().display()
        );
    }

    let mut token = store.config.get_profile(domain)?.token.clone();

    if token.is_empty() {
        token = prompt.prompt_token(domain)?;
        store.config.set_token(domain, &token);
        store.save()?;

        eprintln!("Saved the access token for {domain}");
    }

    Ok(ResolvedProject {
        domain: domain.to_string(),
        project: target.project_path(),
        token,
    })
}

fn apply_explicit_args(
    mut resolved: ResolvedProject,
    config: &Config,
    options: &ResolveOptions,
) -> anyhow::Result<ResolvedProject> {
    if let Some(domain) = &options.profile {
        let profile = config.get_profile(domain)?;

        resolved.domain = domain.clone();
        resolved.token = profile.token.clone();
    }

    if let Some(project) = &options.project {
        resolved.project = project.clone();
    }

    Ok(resolved)
}

/// Picks the remote to resolve against: the first remote on a `gitlab*` host,
/// where a remote named `origin` replaces others on the same host.
fn select_target_remote(remotes: &[RemoteInfo]) -> Result<&RemoteInfo, LabError> {
    let mut candidates: Vec<&RemoteInfo> = Vec::new();

    for remote in remotes
        .iter()
        .filter(|remote| remote.domain.starts_with(GITLAB_DOMAIN_PREFIX))
    {
        match candidates
            .iter_mut()
            .find(|candidate| candidate.domain == remote.domain)
        {
            Some(candidate) if remote.remote == PREFERRED_REMOTE => *candidate = remote,
            Some(_) => {}
            None => candidates.push(remote),
        }
    }

    candidates.first().copied().ok_or(LabError::NoGitlabRemote)
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct FixedToken {
        token: &'static str,
        asked: Cell<u32>,
    }

    impl FixedToken {
        fn new(token: &'static str) -> Self {
            FixedToken {
                token,
                asked: Cell::new(0),
            }
        }
    }

    impl TokenPrompt for FixedToken {
        fn prompt_token(&self, _domain: &str) -> anyhow::Result<String> {
            self.asked.set(self.asked.get() + 1);

            Ok(self.token.to_string())
        }
    }

    fn remote(name: &str, url: &str) -> RemoteInfo {
        git::parse_remote_url(name, url).unwrap()
    }

    fn profile(token: &str, default_project: &str) -> Profile {
        Profile {
            token: token.to_string(),
            default_project: default_project.to_string(),
            ..Profile::default()
        }
    }

    /// A store in a temporary directory with three profiles. P1 is the
    /// default, P2 matches the repository remote, P3 is picked explicitly.
    fn three_profile_store(dir: &tempfile::TempDir) -> ConfigStore {
        let mut store = ConfigStore::load(dir.path().join("config.yml")).unwrap();

        store
            .config
            .set_profile("gitlab.one.com", profile("token-one", "one/default"));
        store.config.set_profile("gitlab.two.com", profile("token-two", ""));
        store.config.set_profile("gitlab.three.com", profile("token-three", ""));
        store.config.default_profile = "gitlab.one.com".to_string();
        store.save().unwrap();

        store
    }

    fn repo_remotes() -> Vec<RemoteInfo> {
        vec![remote("origin", "git@gitlab.two.com:team/app.git")]
    }

    // =========================================================================
    // Precedence
    // =========================================================================

    #[test]
    fn test_default_profile_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = three_profile_store(&dir);
        let resolved = resolve_project(
            &mut store,
            None,
            &FixedToken::new("unused"),
            &ResolveOptions::default(),
        )
        .unwrap();

        assert_eq!(
            resolved,
            ResolvedProject {
                domain: "gitlab.one.com".to_string(),
                project: "one/default".to_string(),
                token: "token-one".to_string(),
            }
        );
    }

    #[test]
    fn test_local_repository_beats_default_profile() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = three_profile_store(&dir);
        let resolved = resolve_project(
            &mut store,
            Some(repo_remotes().as_slice()),
            &FixedToken::new("unused"),
            &ResolveOptions::default(),
        )
        .unwrap();

        assert_eq!(resolved.domain, "gitlab.two.com");
        assert_eq!(resolved.token, "token-two");
        assert_eq!(resolved.project, "team/app");
    }

    #[test]
    fn test_explicit_profile_beats_everything() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = three_profile_store(&dir);
        let resolved = resolve_project(
            &mut store,
            Some(repo_remotes().as_slice()),
            &FixedToken::new("unused"),
            &ResolveOptions {
                profile: Some("gitlab.three.com".to_string()),
                project: Some("other/project".to_string()),
            },
        )
        .unwrap();

        assert_eq!(resolved.domain, "gitlab.three.com");
        assert_eq!(resolved.token, "token-three");
        assert_eq!(resolved.project, "other/project");
    }

    #[test]
    fn test_explicit_profile_keeps_repository_project() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = three_profile_store(&dir);
        let resolved = resolve_project(
            &mut store,
            Some(repo_remotes().as_slice()),
            &FixedToken::new("unused"),
            &ResolveOptions {
                profile: Some("gitlab.three.com".to_string()),
                project: None,
            },
        )
        .unwrap();

        assert_eq!(resolved.project, "team/app");
    }

    // =========================================================================
    // Remote selection
    // =========================================================================

    #[test]
    fn test_origin_wins_on_shared_domain() {
        let remotes = vec![
            remote("fork", "git@gitlab.example.com:me/app.git"),
            remote("origin", "https://gitlab.example.com/team/app.git"),
        ];
        let target = select_target_remote(&remotes).unwrap();

        assert_eq!(target.remote, "origin");
        assert_eq!(target.project_path(), "team/app");
    }

    #[test]
    fn test_first_domain_wins_across_domains() {
        let remotes = vec![
            remote("mirror", "git@gitlab.mirror.com:team/app.git"),
            remote("origin", "git@gitlab.example.com:team/app.git"),
        ];

        assert_eq!(select_target_remote(&remotes).unwrap().remote, "mirror");
    }

    #[test]
    fn test_non_gitlab_remotes_are_ignored() {
        let remotes = vec![
            remote("origin", "git@github.com:team/app.git"),
            remote("upstream", "git@GitLab.example.com:team/app.git"),
        ];

        assert!(matches!(
            select_target_remote(&remotes),
            Err(LabError::NoGitlabRemote)
        ));
    }

    #[test]
    fn test_no_gitlab_remote_aborts_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = three_profile_store(&dir);
        let result = resolve_project(
            &mut store,
            Some(&[remote("origin", "git@github.com:team/app.git")][..]),
            &FixedToken::new("unused"),
            &ResolveOptions::default(),
        );

        assert!(matches!(
            result.unwrap_err().downcast_ref::<LabError>(),
            Some(LabError::NoGitlabRemote)
        ));
    }

    // =========================================================================
    // First run
    // =========================================================================

    #[test]
    fn test_first_run_prompts_and_saves_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        let mut store = ConfigStore::load(&path).unwrap();
        let prompt = FixedToken::new("tok123");
        let resolved = resolve_project(
            &mut store,
            Some(&[remote("origin", "git@gitlab.example.com:group/proj.git")][..]),
            &prompt,
            &ResolveOptions::default(),
        )
        .unwrap();

        assert_eq!(
            resolved,
            ResolvedProject {
                domain: "gitlab.example.com".to_string(),
                project: "group/proj".to_string(),
                token: "tok123".to_string(),
            }
        );
        assert_eq!(prompt.asked.get(), 1);

        let reloaded = ConfigStore::load(&path).unwrap();

        assert_eq!(
            reloaded.config.get_profile("gitlab.example.com").unwrap().token,
            "tok123"
        );
    }

    #[test]
    fn test_known_token_is_not_prompted() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = three_profile_store(&dir);
        let prompt = FixedToken::new("unused");

        resolve_project(
            &mut store,
            Some(repo_remotes().as_slice()),
            &prompt,
            &ResolveOptions::default(),
        )
        .unwrap();

        assert_eq!(prompt.asked.get(), 0);
    }

    // =========================================================================
    // Failures
    // =========================================================================

    #[test]
    fn test_unknown_explicit_profile_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = three_profile_store(&dir);
        let result = resolve_project(
            &mut store,
            None,
            &FixedToken::new("unused"),
            &ResolveOptions {
                profile: Some("gitlab.nowhere.com".to_string()),
                project: None,
            },
        );

        assert!(matches!(
            result.unwrap_err().downcast_ref::<LabError>(),
            Some(LabError::ProfileNotFound(domain)) if domain == "gitlab.nowhere.com"
        ));
    }

    #[test]
    fn test_nothing_to_resolve_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = ConfigStore::load(dir.path().join("config.yml")).unwrap();
        let result = resolve_project(
            &mut store,
            None,
            &FixedToken::new("unused"),
            &ResolveOptions::default(),
        );

        assert!(matches!(
            result.unwrap_err().downcast_ref::<LabError>(),
            Some(LabError::NoProfile)
        ));
    }

    #[test]
    fn test_dangling_default_profile_is_skipped() {
        let mut config = Config::default();

        config.default_profile = "gitlab.gone.com".to_string();

        assert_eq!(
            apply_default_profile(ResolvedProject::default(), &config),
            ResolvedProject::default()
        );
    }

    #[test]
    fn test_resolved_project_urls() {
        let resolved = ResolvedProject {
            domain: "gitlab.example.com".to_string(),
            project: "group/sub/app".to_string(),
            token: String::new(),
        };

        assert_eq!(resolved.api_url(), "https://gitlab.example.com/api/v4");
        assert_eq!(resolved.web_url(), "https://gitlab.example.com/group/sub/app");
        assert_eq!(resolved.require_project().unwrap(), "group/sub/app");
        assert!(matches!(
            ResolvedProject::default().require_project(),
            Err(LabError::NoProject)
        ));
    }
}
