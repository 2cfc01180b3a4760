//! Runners API.
//! https://docs.gitlab.com/api/runners/

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli::gitlab::{GitLabClient, client::project_endpoint, http_client::SendChecked};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum RunnerStatus {
    Online,
    Offline,
    Stale,
    NeverContacted,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum RunnerType {
    InstanceType,
    GroupType,
    ProjectType,
}

/// Which runners to list.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RunnerSource<'a> {
    /// Runners available to a project.
    Project(&'a str),
    /// Runners owned by the current user.
    Owned,
    /// Every runner of the instance. Needs administrator access.
    All,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Runner {
    pub id: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub runner_type: String,
    #[serde(default)]
    pub is_shared: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub online: Option<bool>,
    #[serde(default)]
    pub status: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ListRunnersOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<RunnerStatus>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub runner_type: Option<RunnerType>,
    pub page: u32,
    pub per_page: u32,
}

pub trait RunnerClient {
    fn list_runners(
        &self,
        source: RunnerSource,
        options: &ListRunnersOptions,
    ) -> anyhow::Result<Vec<Runner>>;
}

impl RunnerClient for GitLabClient {
    fn list_runners(
        &self,
        source: RunnerSource,
        options: &ListRunnersOptions,
    ) -> anyhow::Result<Vec<Runner>> {
        let path = match source {
            RunnerSource::Project(project) => format!("{}/runners", project_endpoint(project)),
            RunnerSource::Owned => "runners".to_string(),
            RunnerSource::All => "runners/all".to_string(),
        };

        self.http
            .get(&path)
            .query(options)
            .send_json()
            .context("Failed to list runners")
    }
}
