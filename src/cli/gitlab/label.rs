//! Labels API.
//! https://docs.gitlab.com/api/labels/

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cli::gitlab::{GitLabClient, client::project_endpoint, http_client::SendChecked};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Label {
    pub id: u64,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub open_issues_count: u64,
    #[serde(default)]
    pub open_merge_requests_count: u64,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ListLabelsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub with_counts: bool,
    pub page: u32,
    pub per_page: u32,
}

pub trait LabelClient {
    fn list_labels(&self, project: &str, options: &ListLabelsOptions)
    -> anyhow::Result<Vec<Label>>;
}

impl LabelClient for GitLabClient {
    fn list_labels(
        &self,
        project: &str,
        options: &ListLabelsOptions,
    ) -> anyhow::Result<Vec<Label>> {
        self.http
            .get(&format!("{}/labels", project_endpoint(project)))
            .query(options)
            .send_json()
            .with_context(|| format!("Failed to list labels of {project}"))
    }
}
