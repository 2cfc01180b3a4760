//! Notes (comments) on issues and merge requests.
//! https://docs.gitlab.com/api/notes/

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cli::gitlab::{
    GitLabClient, client::project_endpoint, common::UserRef, http_client::SendChecked,
};

const NOTES_PER_PAGE: u32 = 100;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Note {
    pub id: u64,
    pub author: String,
    pub body: String,
    pub system: bool,
    pub created_at: String,
}

pub trait NoteClient {
    fn list_issue_notes(&self, project: &str, iid: u64) -> anyhow::Result<Vec<Note>>;

    fn list_merge_request_notes(&self, project: &str, iid: u64) -> anyhow::Result<Vec<Note>>;
}

impl NoteClient for GitLabClient {
    fn list_issue_notes(&self, project: &str, iid: u64) -> anyhow::Result<Vec<Note>> {
        self.list_notes(&format!("{}/issues/{iid}/notes", project_endpoint(project)))
            .with_context(|| format!("Failed to list comments of issue #{iid}"))
    }

    fn list_merge_request_notes(&self, project: &str, iid: u64) -> anyhow::Result<Vec<Note>> {
        self.list_notes(&format!(
            "{}/merge_requests/{iid}/notes",
            project_endpoint(project)
        ))
        .with_context(|| format!("Failed to list comments of merge request !{iid}"))
    }
}

impl GitLabClient {
    fn list_notes(&self, path: &str) -> anyhow::Result<Vec<Note>> {
        let notes: Vec<GitLabNote> = self
            .http
            .get(path)
            .query(&[("sort", "asc"), ("order_by", "created_at")])
            .query(&[("per_page", NOTES_PER_PAGE)])
            .send_json()?;

        Ok(notes.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Deserialize)]
struct GitLabNote {
    id: u64,
    body: String,
    author: UserRef,
    #[serde(default)]
    system: bool,
    created_at: String,
}

impl From<GitLabNote> for Note {
    fn from(note: GitLabNote) -> Self {
        Note {
            id: note.id,
            author: note.author.username,
            body: note.body,
            system: note.system,
            created_at: note.created_at,
        }
    }
}
