//! Canonical and loader-side item types
//!
//! Canonical items are what extraction hands to the platform; loader items
//! are what the platform hands back when loading into Asana.

use crate::types::RecordType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Canonical (extraction output)
// ============================================================================

/// A normalized record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalItem<D> {
    pub id: String,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    pub data: D,
}

/// Canonical task fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskData {
    pub name: Option<String>,
    /// External id of the assigned user
    pub assignee: Option<String>,
    pub description: Option<Vec<String>>,
    pub item_url_field: Option<String>,
}

/// Canonical user fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub email: Option<String>,
    pub name: Option<String>,
}

/// Normalized attachment; `parent_id` is the external id of its task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedAttachment {
    pub id: String,
    pub url: Option<String>,
    pub file_name: Option<String>,
    pub parent_id: String,
}

/// Any normalized record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum NormalizedRecord {
    Task(CanonicalItem<TaskData>),
    User(CanonicalItem<UserData>),
    Attachment(NormalizedAttachment),
}

impl NormalizedRecord {
    /// Record type this record belongs to
    pub fn record_type(&self) -> RecordType {
        match self {
            NormalizedRecord::Task(_) => RecordType::Tasks,
            NormalizedRecord::User(_) => RecordType::Users,
            NormalizedRecord::Attachment(_) => RecordType::Attachments,
        }
    }

    /// External id of the record
    pub fn id(&self) -> &str {
        match self {
            NormalizedRecord::Task(item) => &item.id,
            NormalizedRecord::User(item) => &item.id,
            NormalizedRecord::Attachment(attachment) => &attachment.id,
        }
    }
}

// ============================================================================
// Loader side (platform -> Asana)
// ============================================================================

/// Platform and external identifiers of an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemIds {
    pub devrev: String,
    #[serde(default)]
    pub external: Option<String>,
}

/// Assignee reference carried by a platform item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssigneeRef {
    /// The user exists in Asana under this gid
    #[serde(rename = "external")]
    External(String),
    /// The user only exists on the platform
    #[serde(rename = "devrev")]
    Unresolved(String),
}

/// Rich text field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RichText {
    #[serde(default)]
    pub content: Vec<String>,
}

/// Task fields of a platform item
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoaderTaskData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub assignee: Option<AssigneeRef>,
    #[serde(default)]
    pub description: Option<RichText>,
}

/// A platform task to create or update in Asana
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderItem {
    pub id: ItemIds,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub data: LoaderTaskData,
}

/// A platform attachment to create in Asana
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoaderAttachment {
    pub reference_id: String,
    /// Platform id of the task the attachment belongs to
    pub parent_reference_id: String,
    pub file_name: String,
    pub url: String,
    #[serde(default)]
    pub file_type: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// Body of Asana's task create/update endpoints
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPayload {
    pub data: TaskPayloadData,
}

/// Task fields sent to Asana
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPayloadData {
    pub name: String,
    /// Omitted when absent, `null` to clear
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Option<String>>,
    pub notes: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<String>>,
}
