//! Loading module
//!
//! The reverse direction: writes platform tasks and attachments into Asana.
//!
//! Items are processed one by one from the loader cursor. A rate limit
//! stops the invocation with a delay and leaves the cursor on the item that
//! hit it; any other failure is counted against that item only and loading
//! moves on.

mod types;

pub use types::{
    LoadResult, LoadedItem, LoadingReport, MapperLookup, RemoteWriter, StaticMapper,
};

use crate::engine::{PhaseOutcome, RunnerConfig};
use crate::error::{Error, Result};
use crate::http::{Classifier, ErrorClass};
use crate::normalize::{denormalize_task, LoaderAttachment, LoaderItem};
use crate::state::LoaderCursor;
use crate::types::RecordType;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Loads items into Asana
pub struct Loader<'a> {
    writer: &'a dyn RemoteWriter,
    mapper: &'a dyn MapperLookup,
    project_id: String,
    mapper_scope: Option<String>,
    classifier: Classifier,
    execution_budget: Option<Duration>,
}

impl<'a> Loader<'a> {
    /// Create a loader writing into project `project_id`
    pub fn new(
        writer: &'a dyn RemoteWriter,
        mapper: &'a dyn MapperLookup,
        project_id: impl Into<String>,
    ) -> Self {
        Self {
            writer,
            mapper,
            project_id: project_id.into(),
            mapper_scope: None,
            classifier: Classifier::default(),
            execution_budget: None,
        }
    }

    /// Sync unit mapper lookups are scoped to; defaults to the project
    #[must_use]
    pub fn with_mapper_scope(mut self, sync_unit: impl Into<String>) -> Self {
        self.mapper_scope = Some(sync_unit.into());
        self
    }

    /// Apply budget and retry defaults
    #[must_use]
    pub fn with_config(mut self, config: &RunnerConfig) -> Self {
        self.classifier = Classifier::new(config.default_retry_after_secs);
        self.execution_budget = config.execution_budget;
        self
    }

    /// Create or update tasks, starting at `cursor`
    pub async fn load_tasks(&self, items: &[LoaderItem], cursor: &mut LoaderCursor) -> LoadResult {
        self.load_each(RecordType::Tasks, items, cursor, |item| async move {
            let id = self.load_task(item).await?;
            Ok(LoadedItem {
                reference_id: item.id.devrev.clone(),
                external_id: id,
            })
        })
        .await
    }

    /// Create attachments, starting at `cursor`
    pub async fn load_attachments(
        &self,
        attachments: &[LoaderAttachment],
        cursor: &mut LoaderCursor,
    ) -> LoadResult {
        self.load_each(RecordType::Attachments, attachments, cursor, |attachment| async move {
            let id = self.link_attachment(attachment).await?;
            Ok(LoadedItem {
                reference_id: attachment.reference_id.clone(),
                external_id: id,
            })
        })
        .await
    }

    /// Write one task: items already known to Asana are updated, the rest
    /// are created in the sync unit
    pub async fn load_task(&self, item: &LoaderItem) -> Result<String> {
        match item.id.external.as_deref().filter(|id| !id.is_empty()) {
            Some(task_id) => {
                let payload = denormalize_task(item, None);
                self.writer.update_task(task_id, &payload).await
            }
            None => {
                let payload = denormalize_task(item, Some(&self.project_id));
                self.writer.create_task(&payload).await
            }
        }
    }

    /// Resolve the Asana task an attachment belongs to
    pub async fn resolve_parent(&self, attachment: &LoaderAttachment) -> Result<String> {
        self.mapper
            .external_id(
                self.mapper_scope.as_deref().unwrap_or(&self.project_id),
                &attachment.parent_reference_id,
            )
            .await?
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::UnresolvedParent {
                attachment: attachment.reference_id.clone(),
                parent: attachment.parent_reference_id.clone(),
            })
    }

    /// Create an attachment on its resolved parent task. Nothing is sent to
    /// Asana when the parent does not resolve.
    pub async fn link_attachment(&self, attachment: &LoaderAttachment) -> Result<String> {
        let parent = self.resolve_parent(attachment).await?;
        debug!(attachment = %attachment.reference_id, %parent, "Creating attachment");
        self.writer.create_attachment(attachment, &parent).await
    }

    async fn load_each<'i, T, F, Fut>(
        &self,
        record_type: RecordType,
        items: &'i [T],
        cursor: &mut LoaderCursor,
        load: F,
    ) -> LoadResult
    where
        F: Fn(&'i T) -> Fut,
        Fut: Future<Output = Result<LoadedItem>>,
    {
        let started = Instant::now();
        let mut result = LoadResult {
            outcome: PhaseOutcome::Done,
            report: LoadingReport::new(),
            loaded: Vec::new(),
        };

        while let Some(item) = items.get(cursor.next_index) {
            if !result.report.is_empty() && self.budget_spent(started) {
                let percent = loaded_percent(cursor.next_index, items.len());
                info!(%record_type, next_index = cursor.next_index, "Execution budget spent, yielding");
                result.outcome = PhaseOutcome::Progress { percent };
                return result;
            }

            match load(item).await {
                Ok(loaded) => {
                    result.report.add_succeeded(record_type, 1);
                    result.loaded.push(loaded);
                }
                Err(err) => match self.classifier.classify(&err) {
                    ErrorClass::RetryAfter(seconds) => {
                        warn!(%record_type, seconds, next_index = cursor.next_index, "Rate limited, suspending");
                        result.outcome = PhaseOutcome::Delayed { seconds };
                        return result;
                    }
                    ErrorClass::Fatal(message) => {
                        warn!(%record_type, index = cursor.next_index, %message, "Failed to load item");
                        result.report.add_failed(record_type, 1);
                    }
                },
            }

            cursor.next_index += 1;
        }

        info!(%record_type, loaded = result.loaded.len(), "Loading completed");
        result
    }

    fn budget_spent(&self, started: Instant) -> bool {
        self.execution_budget
            .is_some_and(|budget| started.elapsed() >= budget)
    }
}

fn loaded_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    u8::try_from(done * 100 / total).unwrap_or(100)
}
