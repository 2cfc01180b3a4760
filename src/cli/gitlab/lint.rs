//! CI configuration lint API.
//! https://docs.gitlab.com/api/lint/

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cli::gitlab::{GitLabClient, client::project_endpoint, http_client::SendChecked};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct LintResult {
    pub valid: bool,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

pub trait LintClient {
    /// Validates `.gitlab-ci.yml` content in the context of a project.
    fn lint(&self, project: &str, content: &str) -> anyhow::Result<LintResult>;
}

impl LintClient for GitLabClient {
    fn lint(&self, project: &str, content: &str) -> anyhow::Result<LintResult> {
        self.http
            .post(&format!("{}/ci/lint", project_endpoint(project)))
            .json(&serde_json::json!({ "content": content }))
            .send_json()
            .context("Failed to lint the CI configuration")
    }
}
