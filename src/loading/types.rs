//! Loading types

use crate::engine::{ItemReport, PhaseOutcome};
use crate::error::Result;
use crate::normalize::{LoaderAttachment, TaskPayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Writes records into Asana
#[async_trait]
pub trait RemoteWriter: Send + Sync {
    /// Create a task, returning its gid
    async fn create_task(&self, payload: &TaskPayload) -> Result<String>;

    /// Update task `task_id`, returning its gid
    async fn update_task(&self, task_id: &str, payload: &TaskPayload) -> Result<String>;

    /// Attach a file to task `parent_task_id`, returning the attachment gid
    async fn create_attachment(
        &self,
        attachment: &LoaderAttachment,
        parent_task_id: &str,
    ) -> Result<String>;
}

/// Resolves platform ids to Asana ids within a sync unit
#[async_trait]
pub trait MapperLookup: Send + Sync {
    /// External id mapped to platform id `target`, if any
    async fn external_id(&self, sync_unit: &str, target: &str) -> Result<Option<String>>;
}

/// Mapper backed by a fixed table of platform id to Asana id
#[derive(Debug, Clone, Default)]
pub struct StaticMapper {
    mappings: HashMap<String, String>,
}

impl StaticMapper {
    /// Create an empty mapper
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a mapping
    pub fn insert(&mut self, target: impl Into<String>, external_id: impl Into<String>) {
        self.mappings.insert(target.into(), external_id.into());
    }

    /// Record every item created by a loader run
    pub fn extend_from(&mut self, loaded: &[LoadedItem]) {
        for item in loaded {
            self.insert(item.reference_id.clone(), item.external_id.clone());
        }
    }

    /// Number of mappings
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Check whether the mapper is empty
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

impl From<HashMap<String, String>> for StaticMapper {
    fn from(mappings: HashMap<String, String>) -> Self {
        Self { mappings }
    }
}

#[async_trait]
impl MapperLookup for StaticMapper {
    async fn external_id(&self, _sync_unit: &str, target: &str) -> Result<Option<String>> {
        Ok(self.mappings.get(target).cloned())
    }
}

/// An item written to Asana
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedItem {
    /// Platform id of the item
    pub reference_id: String,
    /// Asana gid it was written to
    pub external_id: String,
}

/// Item counts of a loading invocation
pub type LoadingReport = ItemReport;

/// Result of one loading invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub outcome: PhaseOutcome,
    pub report: LoadingReport,
    pub loaded: Vec<LoadedItem>,
}
