//! Issues API.
//! https://docs.gitlab.com/api/issues/

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
pub enum IssueState {
    Opened,
    Closed,
    All,
}

/// An issue, flattened for display.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Issue {
    pub iid: u64,
    pub reference: String,
    pub title: String,
    pub description: String,
    pub state: String,
    pub author: String,
    pub assignee: String,
    pub milestone: String,
    pub labels: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
    pub web_url: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ListIssuesOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
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
pub struct CreateIssueOptions {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UpdateIssueOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_event: Option<StateEvent>,
}

impl UpdateIssueOptions {
    pub fn is_empty(&self) -> bool {
        *self == UpdateIssueOptions::default()
    }
}

pub trait IssueClient {
    /// Issues of one project.
    fn list_project_issues(
        &self,
        project: &str,
        options: &ListIssuesOptions,
    ) -> anyhow::Result<Vec<Issue>>;

    /// Issues across all projects the token can see.
    fn list_all_issues(&self, options: &ListIssuesOptions) -> anyhow::Result<Vec<Issue>>;

    fn get_issue(&self, project: &str, iid: u64) -> anyhow::Result<Issue>;

    fn create_issue(&self, project: &str, options: &CreateIssueOptions) -> anyhow::Result<Issue>;

    fn update_issue(
        &self,
        project: &str,
        iid: u64,
        options: &UpdateIssueOptions,
    ) -> anyhow::Result<Issue>;
}

impl IssueClient for GitLabClient {
    fn list_project_issues(
        &self,
        project: &str,
        options: &ListIssuesOptions,
    ) -> anyhow::Result<Vec<Issue>> {
        let issues: Vec<GitLabIssue> = self
            .http
            .get(&format!("{}/issues", project_endpoint(project)))
            .query(options)
            .send_json()
            .with_context(|| format!("Failed to list issues of {project}"))?;

        Ok(issues.into_iter().map(Into::into).collect())
    }

    fn list_all_issues(&self, options: &ListIssuesOptions) -> anyhow::Result<Vec<Issue>> {
        let issues: Vec<GitLabIssue> = self
            .http
            .get("issues")
            .query(options)
            .send_json()
            .context("Failed to list issues")?;

        Ok(issues.into_iter().map(Into::into).collect())
    }

    fn get_issue(&self, project: &str, iid: u64) -> anyhow::Result<Issue> {
        let issue: GitLabIssue = self
            .http
            .get(&format!("{}/issues/{iid}", project_endpoint(project)))
            .send_json()
            .with_context(|| format!("Failed to get issue #{iid}"))?;

        Ok(issue.into())
    }

    fn create_issue(&self, project: &str, options: &CreateIssueOptions) -> anyhow::Result<Issue> {
        let issue: GitLabIssue = self
            .http
            .post(&format!("{}/issues", project_endpoint(project)))
            .json(options)
            .send_json()
            .with_context(|| format!("Failed to create issue in {project}"))?;

        Ok(issue.into())
    }

    fn update_issue(
        &self,
        project: &str,
        iid: u64,
        options: &UpdateIssueOptions,
    ) -> anyhow::Result<Issue> {
        let issue: GitLabIssue = self
            .http
            .put(&format!("{}/issues/{iid}", project_endpoint(project)))
            .json(options)
            .send_json()
            .with_context(|| format!("Failed to update issue #{iid}"))?;

        Ok(issue.into())
    }
}

/// GitLab API response for issues.
#[derive(Debug, Deserialize)]
struct GitLabIssue {
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
    created_at: String,
    updated_at: String,
    web_url: String,
}

impl From<GitLabIssue> for Issue {
    fn from(issue: GitLabIssue) -> Self {
        Issue {
            iid: issue.iid,
            reference: issue
                .references
                .map(|references| references.full)
                .unwrap_or_else(|| format!("#{}", issue.iid)),
            title: issue.title,
            description: issue.description.unwrap_or_default(),
            state: issue.state,
            author: issue.author.username,
            assignee: common::username(issue.assignee),
            milestone: common::milestone_title(issue.milestone),
            labels: issue.labels,
            created_at: issue.created_at,
            updated_at: issue.updated_at,
            web_url: issue.web_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gitlab_issue_conversion() {
        let json = r##"{
            "id": 100, "iid": 7, "title": "Broken build", "description": null,
            "state": "opened", "author": {"id": 1, "username": "alice"},
            "assignee": {"id": 2, "username": "bob"}, "milestone": null,
            "labels": ["bug"], "references": {"short": "#7", "full": "group/app#7"},
            "created_at": "2024-01-01T00:00:00Z", "updated_at": "2024-01-02T00:00:00Z",
            "web_url": "https://gitlab.example.com/group/app/-/issues/7"
        }"##;
        let issue: Issue = serde_json::from_str::<GitLabIssue>(json).unwrap().into();

        assert_eq!(issue.iid, 7);
        assert_eq!(issue.reference, "group/app#7");
        assert_eq!(issue.description, "");
        assert_eq!(issue.author, "alice");
        assert_eq!(issue.assignee, "bob");
        assert_eq!(issue.milestone, "");
        assert_eq!(issue.labels, vec!["bug"]);
    }

    #[test]
    fn test_list_options_query_skips_unset_filters() {
        let options = ListIssuesOptions {
            state: Some(IssueState::Opened),
            scope: Some(Scope::AssignedToMe),
            page: 1,
            per_page: 20,
            ..ListIssuesOptions::default()
        };
        let query = serde_json::to_value(&options).unwrap();

        assert_eq!(
            query,
            serde_json::json!({
                "state": "opened", "scope": "assigned_to_me", "page": 1, "per_page": 20
            })
        );
    }

    #[test]
    fn test_update_options_is_empty() {
        assert!(UpdateIssueOptions::default().is_empty());
        assert!(
            !UpdateIssueOptions {
                state_event: Some(StateEvent::Close),
                ..UpdateIssueOptions::default()
            }
            .is_empty()
        );
    }
}
