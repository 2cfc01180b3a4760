//! In-memory stand-in for the GitLab API, used by command tests.

use std::{cell::RefCell, collections::BTreeMap};

use reqwest::StatusCode;

use crate::{
    cli::gitlab::{
        ApiClientFactory, CreateIssueOptions, CreateMergeRequestOptions, Issue, IssueClient, Job,
        JobClient, JobScope, Label, LabelClient, LintClient, LintResult, ListIssuesOptions,
        ListLabelsOptions, ListMergeRequestsOptions, ListMilestonesOptions, ListPipelinesOptions,
        ListRunnersOptions, ListUsersOptions, MergeRequest, MergeRequestClient, Milestone,
        MilestoneClient, Note, NoteClient, Pipeline, PipelineClient, ProjectVariable,
        ProjectVariableClient, RepositoryClient, Runner, RunnerClient, RunnerSource, TreeEntry,
        UpdateIssueOptions, UpdateMergeRequestOptions, User, UserClient, VariableOptions,
    },
    error::LabError,
};

/// Canned responses plus a log of every call made.
#[derive(Default)]
pub struct FakeGitLab {
    pub issues: Vec<Issue>,
    pub merge_requests: Vec<MergeRequest>,
    pub notes: Vec<Note>,
    pub pipelines: Vec<Pipeline>,
    pub jobs: Vec<Job>,
    pub trace: String,
    pub labels: Vec<Label>,
    pub users: Vec<User>,
    pub current_user: User,
    pub runners: Vec<Runner>,
    pub milestones: Vec<Milestone>,
    pub tree: Vec<TreeEntry>,
    /// Raw file contents keyed by path.
    pub files: BTreeMap<String, String>,
    pub variables: Vec<ProjectVariable>,
    pub lint_result: LintResult,

    pub calls: RefCell<Vec<String>>,
    pub created_issues: RefCell<Vec<CreateIssueOptions>>,
    pub updated_issues: RefCell<Vec<(u64, UpdateIssueOptions)>>,
    pub created_merge_requests: RefCell<Vec<CreateMergeRequestOptions>>,
    pub updated_merge_requests: RefCell<Vec<(u64, UpdateMergeRequestOptions)>>,
    pub written_variables: RefCell<Vec<(String, VariableOptions)>>,
    pub linted: RefCell<Vec<String>>,
}

impl FakeGitLab {
    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    /// The names of the calls made so far, without arguments.
    pub fn call_names(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|call| call.split(' ').next().unwrap_or_default().to_string())
            .collect()
    }
}

fn not_found(what: &str) -> anyhow::Error {
    LabError::Api {
        status: StatusCode::NOT_FOUND,
        message: format!("404 {what} Not Found"),
    }
    .into()
}

fn page<T: Clone>(items: &[T], page: u32, per_page: u32) -> Vec<T> {
    let start = (page.max(1) as usize - 1) * per_page as usize;

    items.iter().skip(start).take(per_page as usize).cloned().collect()
}

impl IssueClient for FakeGitLab {
    fn list_project_issues(
        &self,
        project: &str,
        options: &ListIssuesOptions,
    ) -> anyhow::Result<Vec<Issue>> {
        self.record(format!("list_project_issues {project} {:?}", options.scope));

        Ok(page(&self.issues, options.page, options.per_page))
    }

    fn list_all_issues(&self, options: &ListIssuesOptions) -> anyhow::Result<Vec<Issue>> {
        self.record(format!("list_all_issues {:?}", options.scope));

        Ok(page(&self.issues, options.page, options.per_page))
    }

    fn get_issue(&self, project: &str, iid: u64) -> anyhow::Result<Issue> {
        self.record(format!("get_issue {project} {iid}"));

        self.issues
            .iter()
            .find(|issue| issue.iid == iid)
            .cloned()
            .ok_or_else(|| not_found("Issue"))
    }

    fn create_issue(&self, project: &str, options: &CreateIssueOptions) -> anyhow::Result<Issue> {
        self.record(format!("create_issue {project}"));
        self.created_issues.borrow_mut().push(options.clone());

        let iid = (self.issues.len() + self.created_issues.borrow().len()) as u64;

        Ok(Issue {
            iid,
            reference: format!("#{iid}"),
            title: options.title.clone(),
            description: options.description.clone().unwrap_or_default(),
            state: "opened".to_string(),
            web_url: format!("https://gitlab.example.com/{project}/-/issues/{iid}"),
            ..Issue::default()
        })
    }

    fn update_issue(
        &self,
        project: &str,
        iid: u64,
        options: &UpdateIssueOptions,
    ) -> anyhow::Result<Issue> {
        self.record(format!("update_issue {project} {iid}"));
        self.updated_issues.borrow_mut().push((iid, options.clone()));

        let mut issue = self
            .issues
            .iter()
            .find(|issue| issue.iid == iid)
            .cloned()
            .ok_or_else(|| not_found("Issue"))?;

        if let Some(title) = &options.title {
            issue.title = title.clone();
        }

        if let Some(description) = &options.description {
            issue.description = description.clone();
        }

        Ok(issue)
    }
}

impl MergeRequestClient for FakeGitLab {
    fn list_project_merge_requests(
        &self,
        project: &str,
        options: &ListMergeRequestsOptions,
    ) -> anyhow::Result<Vec<MergeRequest>> {
        self.record(format!(
            "list_project_merge_requests {project} {:?}",
            options.scope
        ));

        Ok(page(&self.merge_requests, options.page, options.per_page))
    }

    fn list_all_merge_requests(
        &self,
        options: &ListMergeRequestsOptions,
    ) -> anyhow::Result<Vec<MergeRequest>> {
        self.record(format!("list_all_merge_requests {:?}", options.scope));

        Ok(page(&self.merge_requests, options.page, options.per_page))
    }

    fn get_merge_request(&self, project: &str, iid: u64) -> anyhow::Result<MergeRequest> {
        self.record(format!("get_merge_request {project} {iid}"));

        self.merge_requests
            .iter()
            .find(|mr| mr.iid == iid)
            .cloned()
            .ok_or_else(|| not_found("Merge Request"))
    }

    fn create_merge_request(
        &self,
        project: &str,
        options: &CreateMergeRequestOptions,
    ) -> anyhow::Result<MergeRequest> {
        self.record(format!("create_merge_request {project}"));
        self.created_merge_requests.borrow_mut().push(options.clone());

        let iid = (self.merge_requests.len() + self.created_merge_requests.borrow().len()) as u64;

        Ok(MergeRequest {
            iid,
            reference: format!("!{iid}"),
            title: options.title.clone(),
            description: options.description.clone().unwrap_or_default(),
            state: "opened".to_string(),
            source_branch: options.source_branch.clone(),
            target_branch: options.target_branch.clone(),
            web_url: format!("https://gitlab.example.com/{project}/-/merge_requests/{iid}"),
            ..MergeRequest::default()
        })
    }

    fn update_merge_request(
        &self,
        project: &str,
        iid: u64,
        options: &UpdateMergeRequestOptions,
    ) -> anyhow::Result<MergeRequest> {
        self.record(format!("update_merge_request {project} {iid}"));
        self.updated_merge_requests
            .borrow_mut()
            .push((iid, options.clone()));

        let mut mr = self
            .merge_requests
            .iter()
            .find(|mr| mr.iid == iid)
            .cloned()
            .ok_or_else(|| not_found("Merge Request"))?;

        if let Some(title) = &options.title {
            mr.title = title.clone();
        }

        if let Some(description) = &options.description {
            mr.description = description.clone();
        }

        Ok(mr)
    }
}

impl NoteClient for FakeGitLab {
    fn list_issue_notes(&self, project: &str, iid: u64) -> anyhow::Result<Vec<Note>> {
        self.record(format!("list_issue_notes {project} {iid}"));

        Ok(self.notes.clone())
    }

    fn list_merge_request_notes(&self, project: &str, iid: u64) -> anyhow::Result<Vec<Note>> {
        self.record(format!("list_merge_request_notes {project} {iid}"));

        Ok(self.notes.clone())
    }
}

impl PipelineClient for FakeGitLab {
    fn list_pipelines(
        &self,
        project: &str,
        options: &ListPipelinesOptions,
    ) -> anyhow::Result<Vec<Pipeline>> {
        self.record(format!("list_pipelines {project}"));

        Ok(page(&self.pipelines, options.page, options.per_page))
    }

    fn list_pipeline_jobs(&self, project: &str, pipeline_id: u64) -> anyhow::Result<Vec<Job>> {
        self.record(format!("list_pipeline_jobs {project} {pipeline_id}"));

        Ok(self
            .jobs
            .iter()
            .filter(|job| job.pipeline_id == pipeline_id)
            .cloned()
            .collect())
    }
}

impl JobClient for FakeGitLab {
    fn list_jobs(
        &self,
        project: &str,
        scopes: &[JobScope],
        page_number: u32,
        per_page: u32,
    ) -> anyhow::Result<Vec<Job>> {
        self.record(format!("list_jobs {project} {scopes:?}"));

        Ok(page(&self.jobs, page_number, per_page))
    }

    fn get_job_trace(&self, project: &str, job_id: u64) -> anyhow::Result<String> {
        self.record(format!("get_job_trace {project} {job_id}"));

        Ok(self.trace.clone())
    }
}

impl LabelClient for FakeGitLab {
    fn list_labels(
        &self,
        project: &str,
        options: &ListLabelsOptions,
    ) -> anyhow::Result<Vec<Label>> {
        self.record(format!("list_labels {project}"));

        Ok(page(&self.labels, options.page, options.per_page))
    }
}

impl UserClient for FakeGitLab {
    fn list_users(&self, options: &ListUsersOptions) -> anyhow::Result<Vec<User>> {
        self.record(format!("list_users {:?}", options.search));

        Ok(page(&self.users, options.page, options.per_page))
    }

    fn current_user(&self) -> anyhow::Result<User> {
        self.record("current_user");

        Ok(self.current_user.clone())
    }
}

impl RunnerClient for FakeGitLab {
    fn list_runners(
        &self,
        source: RunnerSource,
        options: &ListRunnersOptions,
    ) -> anyhow::Result<Vec<Runner>> {
        self.record(format!("list_runners {source:?}"));

        Ok(page(&self.runners, options.page, options.per_page))
    }
}

impl MilestoneClient for FakeGitLab {
    fn list_milestones(
        &self,
        project: &str,
        options: &ListMilestonesOptions,
    ) -> anyhow::Result<Vec<Milestone>> {
        self.record(format!("list_milestones {project}"));

        Ok(page(&self.milestones, options.page, options.per_page))
    }
}

impl RepositoryClient for FakeGitLab {
    fn list_tree(
        &self,
        project: &str,
        path: &str,
        _git_ref: Option<&str>,
    ) -> anyhow::Result<Vec<TreeEntry>> {
        self.record(format!("list_tree {project} {path}"));

        Ok(self
            .tree
            .iter()
            .filter(|entry| {
                entry
                    .path
                    .rsplit_once('/')
                    .map(|(parent, _)| parent)
                    .unwrap_or_default()
                    == path.trim_end_matches('/')
            })
            .cloned()
            .collect())
    }

    fn get_raw_file(
        &self,
        project: &str,
        path: &str,
        _git_ref: Option<&str>,
    ) -> anyhow::Result<String> {
        self.record(format!("get_raw_file {project} {path}"));

        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| not_found("File"))
    }
}

impl ProjectVariableClient for FakeGitLab {
    fn list_variables(&self, project: &str) -> anyhow::Result<Vec<ProjectVariable>> {
        self.record(format!("list_variables {project}"));

        Ok(self.variables.clone())
    }

    fn create_variable(
        &self,
        project: &str,
        key: &str,
        options: &VariableOptions,
    ) -> anyhow::Result<ProjectVariable> {
        self.record(format!("create_variable {project} {key}"));
        self.written_variables
            .borrow_mut()
            .push((key.to_string(), options.clone()));

        Ok(variable_from(key, options))
    }

    fn update_variable(
        &self,
        project: &str,
        key: &str,
        options: &VariableOptions,
    ) -> anyhow::Result<ProjectVariable> {
        self.record(format!("update_variable {project} {key}"));

        if !self.variables.iter().any(|variable| variable.key == key) {
            return Err(not_found("Variable"));
        }

        self.written_variables
            .borrow_mut()
            .push((key.to_string(), options.clone()));

        Ok(variable_from(key, options))
    }

    fn remove_variable(&self, project: &str, key: &str) -> anyhow::Result<()> {
        self.record(format!("remove_variable {project} {key}"));

        if !self.variables.iter().any(|variable| variable.key == key) {
            return Err(not_found("Variable"));
        }

        Ok(())
    }
}

fn variable_from(key: &str, options: &VariableOptions) -> ProjectVariable {
    ProjectVariable {
        key: key.to_string(),
        value: options.value.clone(),
        variable_type: "env_var".to_string(),
        protected: options.protected.unwrap_or_default(),
        masked: options.masked.unwrap_or_default(),
        environment_scope: options
            .environment_scope
            .clone()
            .unwrap_or_else(|| "*".to_string()),
    }
}

impl LintClient for FakeGitLab {
    fn lint(&self, project: &str, content: &str) -> anyhow::Result<LintResult> {
        self.record(format!("lint {project}"));
        self.linted.borrow_mut().push(content.to_string());

        Ok(self.lint_result.clone())
    }
}

impl ApiClientFactory for FakeGitLab {
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
