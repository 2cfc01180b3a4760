//! Jobs API.
//! https://docs.gitlab.com/api/jobs/

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli::gitlab::{
    GitLabClient, client::project_endpoint, common::UserRef, http_client::SendChecked,
};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum JobScope {
    Created,
    Pending,
    Running,
    Failed,
    Success,
    Canceled,
    Skipped,
    Manual,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Job {
    pub id: u64,
    pub name: String,
    pub stage: String,
    pub status: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    pub pipeline_id: u64,
    pub user: String,
    pub duration: Option<f64>,
    pub created_at: String,
    pub web_url: String,
}

pub trait JobClient {
    fn list_jobs(
        &self,
        project: &str,
        scopes: &[JobScope],
        page: u32,
        per_page: u32,
    ) -> anyhow::Result<Vec<Job>>;

    /// The log output of a job.
    fn get_job_trace(&self, project: &str, job_id: u64) -> anyhow::Result<String>;
}

impl JobClient for GitLabClient {
    fn list_jobs(
        &self,
        project: &str,
        scopes: &[JobScope],
        page: u32,
        per_page: u32,
    ) -> anyhow::Result<Vec<Job>> {
        let scope_query: Vec<(&str, JobScope)> =
            scopes.iter().map(|scope| ("scope[]", *scope)).collect();
        let jobs: Vec<GitLabJob> = self
            .http
            .get(&format!("{}/jobs", project_endpoint(project)))
            .query(&scope_query)
            .query(&[("page", page), ("per_page", per_page)])
            .send_json()
            .with_context(|| format!("Failed to list jobs of {project}"))?;

        Ok(jobs.into_iter().map(Into::into).collect())
    }

    fn get_job_trace(&self, project: &str, job_id: u64) -> anyhow::Result<String> {
        self.http
            .get(&format!("{}/jobs/{job_id}/trace", project_endpoint(project)))
            .send_text()
            .with_context(|| format!("Failed to get the log of job {job_id}"))
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct GitLabJob {
    id: u64,
    name: String,
    stage: String,
    status: String,
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    pipeline: Option<PipelineRef>,
    #[serde(default)]
    user: Option<UserRef>,
    #[serde(default)]
    duration: Option<f64>,
    created_at: String,
    web_url: String,
}

#[derive(Debug, Deserialize)]
struct PipelineRef {
    id: u64,
}

impl From<GitLabJob> for Job {
    fn from(job: GitLabJob) -> Self {
        Job {
            id: job.id,
            name: job.name,
            stage: job.stage,
            status: job.status,
            git_ref: job.git_ref,
            pipeline_id: job.pipeline.map(|pipeline| pipeline.id).unwrap_or_default(),
            user: job.user.map(|user| user.username).unwrap_or_default(),
            duration: job.duration,
            created_at: job.created_at,
            web_url: job.web_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gitlab_job_conversion() {
        let json = r#"{
            "id": 12, "name": "test", "stage": "test", "status": "failed",
            "ref": "main", "pipeline": {"id": 9, "status": "failed"},
            "user": {"username": "alice"}, "duration": 61.5,
            "created_at": "2024-01-01T00:00:00Z",
            "web_url": "https://gitlab.example.com/g/p/-/jobs/12"
        }"#;
        let job: Job = serde_json::from_str::<GitLabJob>(json).unwrap().into();

        assert_eq!(job.pipeline_id, 9);
        assert_eq!(job.user, "alice");
        assert_eq!(job.duration, Some(61.5));
        assert_eq!(job.git_ref, "main");
    }
}
