//! Checkpoint types
//!
//! The checkpoint is serialized as a flat JSON object and handed back and
//! forth with the orchestrator between invocations. Unknown fields are
//! ignored on read so the layout can grow.

use crate::types::RecordType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress of one extraction run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    #[serde(default)]
    pub users: RecordTypeState,

    #[serde(default)]
    pub tasks: RecordTypeState,

    #[serde(default)]
    pub attachments: RecordTypeState,

    /// Start of the last data phase that ran to completion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_sync_started: Option<DateTime<Utc>>,

    /// Start of the data phase currently in flight
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_sync_started: Option<DateTime<Utc>>,

    /// Position of the task loader
    #[serde(default)]
    pub data_loading: LoaderCursor,

    /// Position of the attachment loader
    #[serde(default)]
    pub attachment_loading: LoaderCursor,
}

impl Checkpoint {
    /// Checkpoint of a run that has not started: nothing completed, no
    /// cursors, no watermarks.
    pub fn fresh() -> Self {
        Self::default()
    }

    /// State of a record type
    pub fn get(&self, record_type: RecordType) -> &RecordTypeState {
        match record_type {
            RecordType::Users => &self.users,
            RecordType::Tasks => &self.tasks,
            RecordType::Attachments => &self.attachments,
        }
    }

    /// Mutable state of a record type
    pub fn get_mut(&mut self, record_type: RecordType) -> &mut RecordTypeState {
        match record_type {
            RecordType::Users => &mut self.users,
            RecordType::Tasks => &mut self.tasks,
            RecordType::Attachments => &mut self.attachments,
        }
    }

    /// Check whether a record type is completed
    pub fn is_completed(&self, record_type: RecordType) -> bool {
        self.get(record_type).completed
    }

    /// Store the cursor of the next page to fetch
    pub fn set_cursor(&mut self, record_type: RecordType, cursor: impl Into<String>) {
        self.get_mut(record_type).cursor = Some(cursor.into());
    }

    /// Mark a record type completed, together with every type it jointly
    /// produces. Returns the types marked.
    pub fn mark_completed(&mut self, record_type: RecordType) -> Vec<RecordType> {
        let mut marked = vec![record_type];
        marked.extend_from_slice(record_type.jointly_completed());

        for rt in &marked {
            self.get_mut(*rt).completed = true;
        }
        marked
    }

    /// Put every record type back to its initial state. Watermarks are
    /// cleared too; the caller seeds the ones it needs.
    pub fn reset_record_types(&mut self) {
        for rt in RecordType::ALL {
            *self.get_mut(rt) = RecordTypeState::default();
        }
    }

    /// Number of completed record types
    pub fn completed_count(&self) -> usize {
        RecordType::ALL
            .iter()
            .filter(|rt| self.is_completed(**rt))
            .count()
    }

    /// Check whether every record type is completed
    pub fn all_completed(&self) -> bool {
        self.completed_count() == RecordType::ALL.len()
    }
}

/// Progress of one record type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordTypeState {
    #[serde(default)]
    pub completed: bool,

    /// Opaque token of the next page; `None` starts from the beginning
    #[serde(default, alias = "offset", skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,

    /// Incremental watermark applied to this type's queries
    #[serde(
        default,
        alias = "modifiedSince",
        skip_serializing_if = "Option::is_none"
    )]
    pub changed_since: Option<DateTime<Utc>>,
}

impl RecordTypeState {
    /// Cursor to resume from, treating an empty token as "start"
    pub fn resume_cursor(&self) -> Option<&str> {
        self.cursor.as_deref().filter(|c| !c.is_empty())
    }
}

/// Position of a loader in its item list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderCursor {
    /// Index of the first item not yet processed
    #[serde(default)]
    pub next_index: usize,
}
