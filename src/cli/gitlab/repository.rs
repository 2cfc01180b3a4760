//! Repository tree and files API.
//! https://docs.gitlab.com/api/repositories/
//! https://docs.gitlab.com/api/repository_files/

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cli::gitlab::{
    GitLabClient,
    client::project_endpoint,
    http_client::{SendChecked, encode_segment},
};

/// Lets GitLab pick the default branch.
const DEFAULT_REF: &str = "HEAD";
const TREE_PER_PAGE: u32 = 100;

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TreeEntry {
    pub id: String,
    pub name: String,
    /// `tree` or `blob`
    #[serde(rename = "type")]
    pub kind: String,
    pub path: String,
}

pub trait RepositoryClient {
    /// Entries of a directory. `git_ref` defaults to the default branch.
    fn list_tree(
        &self,
        project: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> anyhow::Result<Vec<TreeEntry>>;

    /// Raw content of a file. `git_ref` defaults to the default branch.
    fn get_raw_file(&self, project: &str, path: &str, git_ref: Option<&str>)
    -> anyhow::Result<String>;
}

impl RepositoryClient for GitLabClient {
    fn list_tree(
        &self,
        project: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> anyhow::Result<Vec<TreeEntry>> {
        self.http
            .get(&format!("{}/repository/tree", project_endpoint(project)))
            .query(&[("path", path), ("ref", git_ref.unwrap_or(DEFAULT_REF))])
            .query(&[("per_page", TREE_PER_PAGE)])
            .send_json()
            .with_context(|| format!("Failed to list repository directory '{path}'"))
    }

    fn get_raw_file(
        &self,
        project: &str,
        path: &str,
        git_ref: Option<&str>,
    ) -> anyhow::Result<String> {
        self.http
            .get(&format!(
                "{}/repository/files/{}/raw",
                project_endpoint(project),
                encode_segment(path)
            ))
            .query(&[("ref", git_ref.unwrap_or(DEFAULT_REF))])
            .send_text()
            .with_context(|| format!("Failed to get repository file '{path}'"))
    }
}
