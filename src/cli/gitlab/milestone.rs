//! Project milestones API.
//! https://docs.gitlab.com/api/milestones/

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli::gitlab::{GitLabClient, client::project_endpoint, http_client::SendChecked};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneState {
    Active,
    Closed,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Milestone {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub web_url: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ListMilestonesOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<MilestoneState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

pub trait MilestoneClient {
    fn list_milestones(
        &self,
        project: &str,
        options: &ListMilestonesOptions,
    ) -> anyhow::Result<Vec<Milestone>>;
}

impl MilestoneClient for GitLabClient {
    fn list_milestones(
        &self,
        project: &str,
        options: &ListMilestonesOptions,
    ) -> anyhow::Result<Vec<Milestone>> {
        self.http
            .get(&format!("{}/milestones", project_endpoint(project)))
            .query(options)
            .send_json()
            .with_context(|| format!("Failed to list milestones of {project}"))
    }
}
