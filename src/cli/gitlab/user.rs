//! Users API.
//! https://docs.gitlab.com/api/users/

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cli::gitlab::{GitLabClient, http_client::SendChecked};

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub web_url: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ListUsersOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub active: bool,
    pub page: u32,
    pub per_page: u32,
}

pub trait UserClient {
    fn list_users(&self, options: &ListUsersOptions) -> anyhow::Result<Vec<User>>;

    /// The user the token belongs to.
    fn current_user(&self) -> anyhow::Result<User>;
}

impl UserClient for GitLabClient {
    fn list_users(&self, options: &ListUsersOptions) -> anyhow::Result<Vec<User>> {
        self.http
            .get("users")
            .query(options)
            .send_json()
            .context("Failed to list users")
    }

    fn current_user(&self) -> anyhow::Result<User> {
        self.http
            .get("user")
            .send_json()
            .context("Failed to get the current user")
    }
}
