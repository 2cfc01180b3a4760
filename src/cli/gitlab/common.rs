//! Parameter and reference types shared by several endpoints.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// `scope` filter of the issue and merge request lists.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Scope {
    CreatedByMe,
    AssignedToMe,
    All,
}

/// `order_by` of the issue and merge request lists.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum OrderBy {
    CreatedAt,
    UpdatedAt,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Sort {
    Asc,
    Desc,
}

/// `state_event` when updating an issue or merge request.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StateEvent {
    Close,
    Reopen,
}

/// The part of a user object embedded in other resources.
#[derive(Clone, Debug, Deserialize)]
pub(super) struct UserRef {
    pub username: String,
}

#[derive(Clone, Debug, Deserialize)]
pub(super) struct MilestoneRef {
    pub title: String,
}

/// Cross-project references, e.g. `group/project#12`.
#[derive(Clone, Debug, Deserialize)]
pub(super) struct References {
    pub full: String,
}

pub(super) fn username(user: Option<UserRef>) -> String {
    user.map(|user| user.username).unwrap_or_default()
}

pub(super) fn milestone_title(milestone: Option<MilestoneRef>) -> String {
    milestone.map(|milestone| milestone.title).unwrap_or_default()
}
