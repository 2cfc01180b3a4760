use crate::cli::gitlab::{
    IssueClient, JobClient, LabelClient, LintClient, MergeRequestClient, MilestoneClient,
    NoteClient, PipelineClient, ProjectVariableClient, RepositoryClient, RunnerClient, UserClient,
    http_client::{HttpClient, encode_segment},
};

/// GitLab REST API v4 client. One instance serves every resource kind.
pub struct GitLabClient {
    pub(super) http: HttpClient,
}

impl GitLabClient {
    /// Creates a client for `base_url` (e.g. `https://gitlab.com/api/v4`)
    /// that authenticates with `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_url` isn't a valid http(s) URL.
    pub fn new(base_url: &str, token: &str) -> anyhow::Result<Self> {
        Ok(GitLabClient {
            http: HttpClient::new(base_url, token)?,
        })
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url().as_str()
    }
}

/// Path prefix of project-scoped endpoints.
pub(super) fn project_endpoint(project: &str) -> String {
    format!("projects/{}", encode_segment(project))
}

/// Hands out the per-resource API of one client.
pub trait ApiClientFactory {
    fn issues(&self) -> &dyn IssueClient;
    fn merge_requests(&self) -> &dyn MergeRequestClient;
    fn notes(&self) -> &dyn NoteClient;
    fn pipelines(&self) -> &dyn PipelineClient;
    fn jobs(&self) -> &dyn JobClient;
    fn labels(&self) -> &dyn LabelClient;
    fn users(&self) -> &dyn UserClient;
    fn runners(&self) -> &dyn RunnerClient;
    fn milestones(&self) -> &dyn MilestoneClient;
    fn repository(&self) -> &dyn RepositoryClient;
    fn project_variables(&self) -> &dyn ProjectVariableClient;
    fn lint(&self) -> &dyn LintClient;
}

impl ApiClientFactory for GitLabClient {
    fn issues(&self) -> &dyn IssueClient {
        self
    }

    fn merge_requests(&self) -> &dyn MergeRequestClient {
        self
    }

    fn notes(&self) -> &dyn NoteClient {
        self
    }

    fn pipelines(&self) -> &dyn PipelineClient {
        self
    }

    fn jobs(&self) -> &dyn JobClient {
        self
    }

    fn labels(&self) -> &dyn LabelClient {
        self
    }

    fn users(&self) -> &dyn UserClient {
        self
    }

    fn runners(&self) -> &dyn RunnerClient {
        self
    }

    fn milestones(&self) -> &dyn MilestoneClient {
        self
    }

    fn repository(&self) -> &dyn RepositoryClient {
        self
    }

    fn project_variables(&self) -> &dyn ProjectVariableClient {
        self
    }

    fn lint(&self) -> &dyn LintClient {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_base_url() {
        let client = GitLabClient::new("https://gitlab.example.com/api/v4", "tok").unwrap();

        assert_eq!(client.base_url(), "https://gitlab.example.com/api/v4");
    }

    #[test]
    fn test_new_rejects_invalid_base_url() {
        assert!(GitLabClient::new("not a url", "tok").is_err());
    }

    #[test]
    fn test_project_endpoint_encodes_path() {
        assert_eq!(project_endpoint("group/sub/repo"), "projects/group%2Fsub%2Frepo");
    }
}
