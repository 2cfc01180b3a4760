//! Project-level CI/CD variables API.
//! https://docs.gitlab.com/api/project_level_variables/

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cli::gitlab::{
    GitLabClient,
    client::project_endpoint,
    http_client::{SendChecked, encode_segment},
};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ProjectVariable {
    pub key: String,
    pub value: String,
    #[serde(default)]
    pub variable_type: String,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub masked: bool,
    #[serde(default)]
    pub environment_scope: String,
}

/// Body of create and update requests.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct VariableOptions {
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment_scope: Option<String>,
}

pub trait ProjectVariableClient {
    fn list_variables(&self, project: &str) -> anyhow::Result<Vec<ProjectVariable>>;

    fn create_variable(
        &self,
        project: &str,
        key: &str,
        options: &VariableOptions,
    ) -> anyhow::Result<ProjectVariable>;

    fn update_variable(
        &self,
        project: &str,
        key: &str,
        options: &VariableOptions,
    ) -> anyhow::Result<ProjectVariable>;

    fn remove_variable(&self, project: &str, key: &str) -> anyhow::Result<()>;
}

impl ProjectVariableClient for GitLabClient {
    fn list_variables(&self, project: &str) -> anyhow::Result<Vec<ProjectVariable>> {
        self.http
            .get(&format!("{}/variables", project_endpoint(project)))
            .query(&[("per_page", 100)])
            .send_json()
            .with_context(|| format!("Failed to list variables of {project}"))
    }

    fn create_variable(
        &self,
        project: &str,
        key: &str,
        options: &VariableOptions,
    ) -> anyhow::Result<ProjectVariable> {
        #[derive(Serialize)]
        struct CreateBody<'a> {
            key: &'a str,
            #[serde(flatten)]
            options: &'a VariableOptions,
        }

        self.http
            .post(&format!("{}/variables", project_endpoint(project)))
            .json(&CreateBody { key, options })
            .send_json()
            .with_context(|| format!("Failed to create variable '{key}'"))
    }

    fn update_variable(
        &self,
        project: &str,
        key: &str,
        options: &VariableOptions,
    ) -> anyhow::Result<ProjectVariable> {
        self.http
            .put(&format!(
                "{}/variables/{}",
                project_endpoint(project),
                encode_segment(key)
            ))
            .json(options)
            .send_json()
            .with_context(|| format!("Failed to update variable '{key}'"))
    }

    fn remove_variable(&self, project: &str, key: &str) -> anyhow::Result<()> {
        self.http
            .delete(&format!(
                "{}/variables/{}",
                project_endpoint(project),
                encode_segment(key)
            ))
            .send_empty()
            .with_context(|| format!("Failed to delete variable '{key}'"))
    }
}
