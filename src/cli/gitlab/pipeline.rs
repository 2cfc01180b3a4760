//! Pipelines API.
//! https://docs.gitlab.com/api/pipelines/

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli::gitlab::{
    GitLabClient, Job, client::project_endpoint, common::Sort, http_client::SendChecked,
    job::GitLabJob,
};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PipelineScope {
    Running,
    Pending,
    Finished,
    Branches,
    Tags,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum PipelineStatus {
    Created,
    WaitingForResource,
    Preparing,
    Pending,
    Running,
    Success,
    Failed,
    Canceled,
    Skipped,
    Manual,
    Scheduled,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum PipelineOrderBy {
    Id,
    Status,
    Ref,
    UpdatedAt,
    UserId,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Pipeline {
    pub id: u64,
    pub status: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub sha: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    pub web_url: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ListPipelinesOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<PipelineScope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PipelineStatus>,
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub git_ref: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<PipelineOrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    pub page: u32,
    pub per_page: u32,
}

pub trait PipelineClient {
    fn list_pipelines(
        &self,
        project: &str,
        options: &ListPipelinesOptions,
    ) -> anyhow::Result<Vec<Pipeline>>;

    fn list_pipeline_jobs(&self, project: &str, pipeline_id: u64) -> anyhow::Result<Vec<Job>>;
}

impl PipelineClient for GitLabClient {
    fn list_pipelines(
        &self,
        project: &str,
        options: &ListPipelinesOptions,
    ) -> anyhow::Result<Vec<Pipeline>> {
        self.http
            .get(&format!("{}/pipelines", project_endpoint(project)))
            .query(options)
            .send_json()
            .with_context(|| format!("Failed to list pipelines of {project}"))
    }

    fn list_pipeline_jobs(&self, project: &str, pipeline_id: u64) -> anyhow::Result<Vec<Job>> {
        let jobs: Vec<GitLabJob> = self
            .http
            .get(&format!(
                "{}/pipelines/{pipeline_id}/jobs",
                project_endpoint(project)
            ))
            .query(&[("per_page", 100)])
            .send_json()
            .with_context(|| format!("Failed to list jobs of pipeline {pipeline_id}"))?;

        Ok(jobs.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_ref_field_name() {
        let pipeline: Pipeline = serde_json::from_str(
            r#"{"id": 9, "status": "success", "ref": "main", "sha": "abc",
                "web_url": "https://gitlab.example.com/g/p/-/pipelines/9"}"#,
        )
        .unwrap();

        assert_eq!(pipeline.git_ref, "main");
        assert_eq!(pipeline.source, "");
    }

    #[test]
    fn test_list_options_query_names() {
        let options = ListPipelinesOptions {
            status: Some(PipelineStatus::WaitingForResource),
            git_ref: Some("main".to_string()),
            order_by: Some(PipelineOrderBy::UpdatedAt),
            page: 2,
            per_page: 10,
            ..ListPipelinesOptions::default()
        };

        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            serde_json::json!({
                "status": "waiting_for_resource", "ref": "main",
                "order_by": "updated_at", "page": 2, "per_page": 10
            })
        );
    }
}
