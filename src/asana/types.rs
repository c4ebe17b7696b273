//! Typed Asana records
//!
//! Only the fields requested through `opt_fields` are modelled. Unknown
//! fields are ignored so Asana can add to its payloads freely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope of every Asana list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub next_page: Option<NextPageRef>,
}

/// Continuation block of a list response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextPageRef {
    #[serde(default)]
    pub offset: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// Envelope of every Asana single-object endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DataResponse<T> {
    pub data: T,
}

/// A workspace user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsanaUser {
    pub gid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Compact reference to another Asana object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsanaRef {
    pub gid: String,
    #[serde(default)]
    pub resource_type: Option<String>,
}

/// A task, with its attachments embedded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsanaTask {
    pub gid: String,
    #[serde(default)]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assignee: Option<AsanaRef>,
    #[serde(default)]
    pub html_notes: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AsanaAttachment>,
}

/// Attachment metadata embedded in a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AsanaAttachment {
    pub gid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// A project; projects are the sync units
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AsanaProject {
    pub gid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub resource_type: Option<String>,
}

/// Response of `/projects/{gid}/task_counts`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskCounts {
    #[serde(default)]
    pub num_tasks: Option<u64>,
}

/// A raw record as returned by a paginated endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum ExternalRecord {
    User(AsanaUser),
    Task(AsanaTask),
}

impl ExternalRecord {
    /// Asana gid of the record
    pub fn gid(&self) -> &str {
        match self {
            ExternalRecord::User(user) => &user.gid,
            ExternalRecord::Task(task) => &task.gid,
        }
    }
}
