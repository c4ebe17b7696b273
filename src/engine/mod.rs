//! Execution engine module
//!
//! The data phase state machine: walks record types in priority order,
//! paginates each one from its checkpointed cursor, forwards normalized
//! items to the sink and turns failures into a suspension or a phase error.
//!
//! # Overview
//!
//! The engine module provides:
//! - `PhaseRunner` - Runs one invocation of the data extraction phase
//! - `RunnerConfig` - Budget, per-page flushing and retry defaults
//! - `PhaseOutcome` / `PhaseResult` - What the invocation ended with
//!
//! The checkpoint is only ever mutated after a page has been fetched and
//! forwarded, so a suspension leaves it exactly at the last forwarded page.

mod types;

pub use types::{
    ExtractionReport, ExtractionRequest, Invocation, ItemCounts, ItemReport, PhaseOutcome,
    PhaseResult, RunnerConfig,
};

use crate::error::Result;
use crate::http::{Classifier, ErrorClass};
use crate::normalize::{normalize_page, NormalizeContext, NormalizedRecord};
use crate::output::ItemSink;
use crate::pagination::{Page, PageFilters, Paginator};
use crate::state::{Checkpoint, CheckpointStore};
use crate::types::{RecordType, SyncMode};
use chrono::{DateTime, Utc};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Record types narrowed by the incremental watermark
const INCREMENTAL_RECORD_TYPES: [RecordType; 1] = [RecordType::Tasks];

/// How the pagination of one record type stopped
enum Step {
    Exhausted,
    Yielded,
}

/// Counters shared across the record types of one invocation
struct Tally {
    report: ExtractionReport,
    pages_fetched: usize,
    started: Instant,
}

/// Runs the data extraction phase
pub struct PhaseRunner<'a> {
    paginator: &'a dyn Paginator,
    context: NormalizeContext,
    config: RunnerConfig,
    classifier: Classifier,
    store: Option<&'a dyn CheckpointStore>,
}

impl<'a> PhaseRunner<'a> {
    /// Create a runner reading from `paginator`
    pub fn new(paginator: &'a dyn Paginator, context: NormalizeContext) -> Self {
        let config = RunnerConfig::default();
        Self {
            paginator,
            context,
            classifier: Classifier::new(config.default_retry_after_secs),
            config,
            store: None,
        }
    }

    /// Set runner configuration
    #[must_use]
    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.classifier = Classifier::new(config.default_retry_after_secs);
        self.config = config;
        self
    }

    /// Flush the checkpoint here after every page when `state_per_page` is on
    #[must_use]
    pub fn with_store(mut self, store: &'a dyn CheckpointStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Run one invocation of the data phase against `checkpoint`
    pub async fn run(
        &self,
        request: &ExtractionRequest,
        checkpoint: &mut Checkpoint,
        sink: &mut dyn ItemSink,
    ) -> PhaseResult {
        let mut tally = Tally {
            report: ExtractionReport::new(),
            pages_fetched: 0,
            started: Instant::now(),
        };

        if request.is_start() {
            self.begin_run(request, checkpoint);
        }

        let outcome = self.run_record_types(checkpoint, sink, &mut tally).await;

        PhaseResult {
            outcome,
            report: tally.report,
            pages_fetched: tally.pages_fetched,
        }
    }

    async fn run_record_types(
        &self,
        checkpoint: &mut Checkpoint,
        sink: &mut dyn ItemSink,
        tally: &mut Tally,
    ) -> PhaseOutcome {
        for record_type in RecordType::ALL {
            if checkpoint.is_completed(record_type) {
                info!(%record_type, "Record type already completed, skipping");
                checkpoint.mark_completed(record_type);
                continue;
            }

            if let Some(owner) = record_type.derived_from() {
                debug!(%record_type, %owner, "Extracted from its owner's pages, nothing to paginate");
                continue;
            }

            info!(%record_type, cursor = ?checkpoint.get(record_type).cursor, "Extracting record type");

            match self
                .extract_record_type(record_type, checkpoint, sink, tally)
                .await
            {
                Ok(Step::Exhausted) => {}
                Ok(Step::Yielded) => {
                    let percent = progress_percent(checkpoint);
                    info!(%record_type, percent, pages = tally.pages_fetched, "Execution budget spent, yielding");
                    return PhaseOutcome::Progress { percent };
                }
                Err(err) => return self.classify_failure(record_type, &err),
            }
        }

        if let Some(started) = checkpoint.current_sync_started.take() {
            checkpoint.last_successful_sync_started = Some(started);
        }

        info!(pages = tally.pages_fetched, "Data extraction completed");
        PhaseOutcome::Done
    }

    /// Open a run: stamp its start and reset every record type. Incremental
    /// runs also seed the watermark. `last_successful_sync_started` is kept
    /// until this run completes.
    fn begin_run(&self, request: &ExtractionRequest, checkpoint: &mut Checkpoint) {
        checkpoint.current_sync_started = Some(self.context.extracted_at);
        checkpoint.reset_record_types();

        if request.mode != SyncMode::Incremental {
            info!("Starting full run");
            return;
        }

        let since = incremental_floor(request, checkpoint.last_successful_sync_started);
        for record_type in INCREMENTAL_RECORD_TYPES {
            checkpoint.get_mut(record_type).changed_since = since;
        }

        info!(?since, "Starting incremental window");
    }

    async fn extract_record_type(
        &self,
        record_type: RecordType,
        checkpoint: &mut Checkpoint,
        sink: &mut dyn ItemSink,
        tally: &mut Tally,
    ) -> Result<Step> {
        let filters = PageFilters {
            modified_since: checkpoint.get(record_type).changed_since,
        };

        loop {
            if tally.pages_fetched > 0 && self.budget_spent(tally.started) {
                return Ok(Step::Yielded);
            }

            let cursor = checkpoint
                .get(record_type)
                .resume_cursor()
                .map(str::to_string);

            let page = self
                .paginator
                .fetch_page(record_type, cursor.as_deref(), &filters)
                .await?;
            tally.pages_fetched += 1;

            debug!(
                %record_type,
                ?cursor,
                records = page.len(),
                next = ?page.next_cursor,
                "Fetched page"
            );

            self.forward(record_type, &page, sink, &mut tally.report)
                .await?;

            let exhausted = match &page.next_cursor {
                Some(next) => {
                    checkpoint.set_cursor(record_type, next.clone());
                    false
                }
                None => {
                    let marked = checkpoint.mark_completed(record_type);
                    info!(?marked, "Record type completed");
                    true
                }
            };

            if self.config.state_per_page {
                if let Some(store) = self.store {
                    store.flush(checkpoint).await?;
                }
            }

            if exhausted {
                return Ok(Step::Exhausted);
            }
        }
    }

    /// Normalize a page and push it to the sink, owner records first.
    ///
    /// Delivery is at-least-once: the cursor only moves after every group
    /// of the page is pushed, so a failure on a later group re-sends the
    /// earlier ones on resume. Items carry stable ids for the platform to
    /// de-duplicate on.
    async fn forward(
        &self,
        record_type: RecordType,
        page: &Page,
        sink: &mut dyn ItemSink,
        report: &mut ExtractionReport,
    ) -> Result<()> {
        for (item_type, records) in normalize_page(record_type, page, &self.context) {
            let (kept, dropped): (Vec<_>, Vec<_>) =
                records.into_iter().partition(is_transferable);

            if !dropped.is_empty() {
                for record in &dropped {
                    warn!(%item_type, id = record.id(), "Attachment has no download URL, skipping");
                }
                report.add_skipped(item_type, dropped.len());
            }

            if kept.is_empty() {
                continue;
            }

            let count = kept.len();
            let items = kept
                .iter()
                .map(serde_json::to_value)
                .collect::<serde_json::Result<Vec<_>>>()?;

            if let Err(err) = sink.push(item_type.as_str(), items).await {
                report.add_failed(item_type, count);
                return Err(err);
            }
            report.add_succeeded(item_type, count);
        }

        Ok(())
    }

    fn budget_spent(&self, started: Instant) -> bool {
        self.config
            .execution_budget
            .is_some_and(|budget| started.elapsed() >= budget)
    }

    fn classify_failure(&self, record_type: RecordType, err: &crate::error::Error) -> PhaseOutcome {
        match self.classifier.classify(err) {
            ErrorClass::RetryAfter(seconds) => {
                warn!(%record_type, seconds, "Rate limited, suspending");
                PhaseOutcome::Delayed { seconds }
            }
            ErrorClass::Fatal(detail) => {
                let message = format!("Failed to extract {record_type}: {detail}");
                error!(%record_type, "{message}");
                PhaseOutcome::Failed { message }
            }
        }
    }
}

/// Watermark of an incremental window. An explicit floor always wins;
/// otherwise a reset walks everything and a plain incremental run starts at
/// the last successful sync.
pub fn incremental_floor(
    request: &ExtractionRequest,
    last_successful_sync_started: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match (request.extract_from, request.reset_extract_from) {
        (Some(from), _) => Some(from),
        (None, true) => None,
        (None, false) => last_successful_sync_started,
    }
}

/// Share of completed record types, in percent
pub fn progress_percent(checkpoint: &Checkpoint) -> u8 {
    let total = RecordType::ALL.len();
    u8::try_from(checkpoint.completed_count() * 100 / total).unwrap_or(100)
}

fn is_transferable(record: &NormalizedRecord) -> bool {
    !matches!(record, NormalizedRecord::Attachment(a) if a.url.is_none())
}
