//! Normalization and denormalization
//!
//! Pure, total mappings between Asana records and the platform's canonical
//! items. Nothing in here performs I/O or reads the clock; the extraction
//! time is passed in through [`NormalizeContext`].

mod types;

pub use types::{
    AssigneeRef, CanonicalItem, ItemIds, LoaderAttachment, LoaderItem, LoaderTaskData,
    NormalizedAttachment, NormalizedRecord, RichText, TaskData, TaskPayload, TaskPayloadData,
    UserData,
};

use crate::asana::{AsanaAttachment, AsanaTask, AsanaUser, ExternalRecord};
use crate::pagination::Page;
use crate::types::{OptionStringExt, RecordType};
use chrono::{DateTime, Utc};
use tracing::warn;

/// Inputs normalization needs beyond the record itself
#[derive(Debug, Clone)]
pub struct NormalizeContext {
    /// Base URL of the Asana web app, for task links
    pub app_base: String,
    /// Project the run is scoped to
    pub project_id: String,
    /// Timestamp used where Asana provides none (users)
    pub extracted_at: DateTime<Utc>,
}

impl NormalizeContext {
    /// Link to a task in the Asana web app
    pub fn item_url(&self, task_gid: &str) -> String {
        format!(
            "{}/{}/{}",
            self.app_base.trim_end_matches('/'),
            self.project_id,
            task_gid
        )
    }
}

/// Normalize a task
pub fn normalize_task(task: &AsanaTask, ctx: &NormalizeContext) -> CanonicalItem<TaskData> {
    CanonicalItem {
        id: task.gid.clone(),
        created_date: task.created_at,
        modified_date: task.modified_at.unwrap_or(task.created_at),
        data: TaskData {
            name: task.name.clone().none_if_empty(),
            assignee: task.assignee.as_ref().map(|a| a.gid.clone()),
            description: task
                .html_notes
                .clone()
                .none_if_empty()
                .map(|notes| vec![notes]),
            item_url_field: Some(ctx.item_url(&task.gid)),
        },
    }
}

/// Normalize a user. Asana exposes no timestamps for users.
pub fn normalize_user(user: &AsanaUser, ctx: &NormalizeContext) -> CanonicalItem<UserData> {
    CanonicalItem {
        id: user.gid.clone(),
        created_date: ctx.extracted_at,
        modified_date: ctx.extracted_at,
        data: UserData {
            email: user.email.clone().none_if_empty(),
            name: user.name.clone().none_if_empty(),
        },
    }
}

/// Normalize an attachment found on task `parent_gid`
pub fn normalize_attachment(attachment: &AsanaAttachment, parent_gid: &str) -> NormalizedAttachment {
    NormalizedAttachment {
        id: attachment.gid.clone(),
        url: attachment.download_url.clone(),
        file_name: attachment.name.clone(),
        parent_id: parent_gid.to_string(),
    }
}

/// Normalized records of one page, grouped by record type.
///
/// The page's own record type comes first, followed by the types it
/// jointly produces (attachments after tasks). Groups are never omitted, so
/// an empty dependent group is still reported.
pub fn normalize_page(
    record_type: RecordType,
    page: &Page,
    ctx: &NormalizeContext,
) -> Vec<(RecordType, Vec<NormalizedRecord>)> {
    let mut primary = Vec::with_capacity(page.len());
    let mut attachments = Vec::new();

    for record in &page.records {
        match record {
            ExternalRecord::User(user) => {
                primary.push(NormalizedRecord::User(normalize_user(user, ctx)));
            }
            ExternalRecord::Task(task) => {
                primary.push(NormalizedRecord::Task(normalize_task(task, ctx)));
                attachments.extend(
                    task.attachments
                        .iter()
                        .map(|a| NormalizedRecord::Attachment(normalize_attachment(a, &task.gid))),
                );
            }
        }
    }

    let mut groups = vec![(record_type, primary)];
    for dependent in record_type.jointly_completed() {
        if *dependent == RecordType::Attachments {
            groups.push((*dependent, std::mem::take(&mut attachments)));
        }
    }
    groups
}

/// Build the Asana payload for a platform task.
///
/// `project_id` is set when creating, so the task lands in the sync unit.
/// An assignee that only exists on the platform clears the Asana assignee.
pub fn denormalize_task(item: &LoaderItem, project_id: Option<&str>) -> TaskPayload {
    let assignee = match &item.data.assignee {
        Some(AssigneeRef::External(gid)) => Some(Some(gid.clone())),
        Some(AssigneeRef::Unresolved(platform_id)) => {
            warn!(
                item = %item.id.devrev,
                user = %platform_id,
                "Assignee does not exist in Asana, clearing it"
            );
            Some(None)
        }
        None => None,
    };

    TaskPayload {
        data: TaskPayloadData {
            name: item.data.name.clone().unwrap_or_default(),
            assignee,
            notes: item
                .data
                .description
                .as_ref()
                .and_then(|d| d.content.first().cloned())
                .unwrap_or_default(),
            projects: project_id.map(|p| vec![p.to_string()]),
        },
    }
}

#[cfg(test)]
mod tests;
