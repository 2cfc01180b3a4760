//! Merge requests API.
//! https://docs.gitlab.com/api/merge_requests/

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cli::gitlab::{
    GitLabClient,
    client::project_endpoint,
    common::{self, MilestoneRef, OrderBy, References, Scope, Sort, StateEvent, UserRef},
    http_client::SendChecked,
};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MergeRequestState {
    Opened,
    Closed,
    Locked,
    Merged,
    All,
}

/// A merge request, flattened for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MergeRequest {
    pub iid: u64,
    pub reference: String,
    pub title: String,
    pub description: String,
    pub state: String,
    pub author: String,
    pub assignee: String,
    pub milestone: String,
    pub labels: Vec<String>,
    pub source_branch: String,
    pub target_branch: String,
    pub draft: bool,
    pub merge_status: String,
    pub created_at: String,
    pub updated_at: String,
    pub web_url: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ListMergeRequestsOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<MergeRequestState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<OrderBy>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    pub page: u32,
    pub per_page: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CreateMergeRequestOptions {
    pub source_branch: String,
    pub target_branch: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UpdateMergeRequestOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_event: Option<StateEvent>,
}

impl UpdateMergeRequestOptions {
    pub fn is_empty(&self) -> bool {
        *self == UpdateMergeRequestOptions::default()
    }
}

pub trait MergeRequestClient {
    fn list_project_merge_requests(
        &self,
        project: &str,
        options: &ListMergeRequestsOptions,
    ) -> anyhow::Result<Vec<MergeRequest>>;

    fn list_all_merge_requests(
        &self,
        options: &ListMergeRequestsOptions,
    ) -> anyhow::Result<Vec<MergeRequest>>;

    fn get_merge_request(&self, project: &str, iid: u64) -> anyhow::Result<MergeRequest>;

    fn create_merge_request(
        &self,
        project: &str,
        options: &CreateMergeRequestOptions,
    ) -> anyhow::Result<MergeRequest>;

    fn update_merge_request(
        &self,
        project: &str,
        iid: u64,
        options: &UpdateMergeRequestOptions,
    ) -> anyhow::Result<MergeRequest>;
}

impl MergeRequestClient for GitLabClient {
    fn list_project_merge_requests(
        &self,
        project: &str,
        options: &ListMergeRequestsOptions,
    ) -> anyhow::Result<Vec<MergeRequest>> {
        let mrs: Vec<GitLabMergeRequest> = self
            .http
            .get(&format!("{}/merge_requests", project_endpoint(project)))
            .query(options)
            .send_json()
            .with_context(|| format!("Failed to list merge requests of {project}"))?;

        Ok(mrs.into_iter().map(Into::into).collect())
    }

    fn list_all_merge_requests(
        &self,
        options: &ListMergeRequestsOptions,
    ) -> anyhow::Result<Vec<MergeRequest>> {
        let mrs: Vec<GitLabMergeRequest> = self
            .http
            .get("merge_requests")
            .query(options)
            .send_json()
            .context("Failed to list merge requests")?;

        Ok(mrs.into_iter().map(Into::into).collect())
    }

    fn get_merge_request(&self, project: &str, iid: u64) -> anyhow::Result<MergeRequest> {
        let mr: GitLabMergeRequest = self
            .http
            .get(&format!("{}/merge_requests/{iid}", project_endpoint(project)))
            .send_json()
            .with_context(|| format!("Failed to get merge request !{iid}"))?;

        Ok(mr.into())
    }

    fn create_merge_request(
        &self,
        project: &str,
        options: &CreateMergeRequestOptions,
    ) -> anyhow::Result<MergeRequest> {
        let mr: GitLabMergeRequest = self
            .http
            .post(&format!("{}/merge_requests", project_endpoint(project)))
            .json(options)
            .send_json()
            .with_context(|| format!("Failed to create merge request in {project}"))?;

        Ok(mr.into())
    }

    fn update_merge_request(
        &self,
        project: &str,
        iid: u64,
        options: &UpdateMergeRequestOptions,
    ) -> anyhow::Result<MergeRequest> {
        let mr: GitLabMergeRequest = self
            .http
            .put(&format!("{}/merge_requests/{iid}", project_endpoint(project)))
            .json(options)
            .send_json()
            .with_context(|| format!("Failed to update merge request !{iid}"))?;

        Ok(mr.into())
    }
}

/// GitLab API response for merge requests.
#[derive(Debug, Deserialize)]
struct GitLabMergeRequest {
    iid: u64,
    title: String,
    #[serde(default)]
    description: Option<String>,
    state: String,
    author: UserRef,
    #[serde(default)]
    assignee: Option<UserRef>,
    #[serde(default)]
    milestone: Option<MilestoneRef>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    references: Option<References>,
    source_branch: String,
    target_branch: String,
    #[serde(default)]
    draft: bool,
    #[serde(default)]
    detailed_merge_status: Option<String>,
    #[serde(default)]
    merge_status: Option<String>,
    created_at: String,
    updated_at: String,
    web_url: String,
}

impl From<GitLabMergeRequest> for MergeRequest {
    fn from(mr: GitLabMergeRequest) -> Self {
        MergeRequest {
            iid: mr.iid,
            reference: mr
                .references
                .map(|references| references.full)
                .unwrap_or_else(|| format!("!{}", mr.iid)),
            title: mr.title,
            description: mr.description.unwrap_or_default(),
            state: mr.state,
            author: mr.author.username,
            assignee: common::username(mr.assignee),
            milestone: common::milestone_title(mr.milestone),
            labels: mr.labels,
            source_branch: mr.source_branch,
            target_branch: mr.target_branch,
            draft: mr.draft,
            merge_status: mr
                .detailed_merge_status
                .or(mr.merge_status)
                .unwrap_or_default(),
            created_at: mr.created_at,
            updated_at: mr.updated_at,
            web_url: mr.web_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gitlab_merge_request_conversion() {
        let json = r#"{
            "iid": 3, "title": "Draft: Add lint", "description": "Adds lint",
            "state": "opened", "author": {"username": "alice"},
            "milestone": {"id": 1, "title": "v1.0"}, "labels": [],
            "source_branch": "lint", "target_branch": "main", "draft": true,
            "merge_status": "can_be_merged", "detailed_merge_status": "mergeable",
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-02T00:00:00Z",
            "web_url": "https://gitlab.example.com/group/app/-/merge_requests/3"
        }"#;
        let mr: MergeRequest = serde_json::from_str::<GitLabMergeRequest>(json).unwrap().into();

        assert_eq!(mr.reference, "!3");
        assert_eq!(mr.assignee, "");
        assert_eq!(mr.milestone, "v1.0");
        assert!(mr.draft);
        assert_eq!(mr.merge_status, "mergeable");
        assert_eq!(mr.source_branch, "lint");
    }

    #[test]
    fn test_create_options_body() {
        let options = CreateMergeRequestOptions {
            source_branch: "feature".to_string(),
            target_branch: "main".to_string(),
            title: "Feature".to_string(),
            assignee_id: Some(5),
            ..CreateMergeRequestOptions::default()
        };

        assert_eq!(
            serde_json::to_value(&options).unwrap(),
            serde_json::json!({
                "source_branch": "feature", "target_branch": "main",
                "title": "Feature", "assignee_id": 5
            })
        );
    }
}
