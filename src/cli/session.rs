//! Everything a command needs to talk to GitLab, built once per invocation.

use anyhow::Context;

use crate::cli::{
    GlobalArgs,
    config::{ConfigStore, Profile},
    gitlab::{ApiClientFactory, GitLabClient},
    resolve::{self, ResolvedProject, StdinTokenPrompt},
};

pub struct Session {
    pub store: ConfigStore,
    pub project: ResolvedProject,
    client: GitLabClient,
}

impl Session {
    /// Loads the config, resolves the target project and builds the API
    /// client.
    pub fn open(global: &GlobalArgs) -> anyhow::Result<Session> {
        let mut store = ConfigStore::load_default()?;
        let remotes = resolve::local_remotes()?;
        let project = resolve::resolve_project(
            &mut store,
            remotes.as_deref(),
            &StdinTokenPrompt,
            &global.resolve_options(),
        )?;
        let client = GitLabClient::new(&project.api_url(), &project.token)
            .with_context(|| format!("Failed to set up the API client for {}", project.domain))?;

        tracing::debug!(base_url = client.base_url(), "created the API client");

        Ok(Session {
            store,
            project,
            client,
        })
    }

    /// The profile of the resolved domain. Empty if the domain has none.
    pub fn profile(&self) -> Profile {
        self.store
            .config
            .get_profile(&self.project.domain)
            .cloned()
            .unwrap_or_default()
    }

    pub fn api(&self) -> &dyn ApiClientFactory {
        &self.client
    }
}
