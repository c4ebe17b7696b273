//! Engine types
//!
//! Configuration, requests and outcomes of the phase runner.

use crate::config::ExtractionConfig;
use crate::types::{RecordType, SyncMode};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Configuration for the phase runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Wall-clock budget of one invocation; `None` runs to completion
    pub execution_budget: Option<Duration>,
    /// Whether to flush the checkpoint after each page
    pub state_per_page: bool,
    /// Delay reported for a 429 without a usable `Retry-After`
    pub default_retry_after_secs: u64,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            execution_budget: None,
            state_per_page: false,
            default_retry_after_secs: 60,
        }
    }
}

impl RunnerConfig {
    /// Create a new runner config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the execution budget
    #[must_use]
    pub fn with_execution_budget(mut self, budget: Duration) -> Self {
        self.execution_budget = Some(budget);
        self
    }

    /// Flush state after each page
    #[must_use]
    pub fn with_state_per_page(mut self, flush: bool) -> Self {
        self.state_per_page = flush;
        self
    }

    /// Set the default retry delay
    #[must_use]
    pub fn with_default_retry_after(mut self, secs: u64) -> Self {
        self.default_retry_after_secs = secs;
        self
    }
}

impl From<&ExtractionConfig> for RunnerConfig {
    fn from(config: &ExtractionConfig) -> Self {
        Self {
            execution_budget: config.execution_budget(),
            state_per_page: config.state_per_page,
            default_retry_after_secs: config.default_retry_after_secs,
        }
    }
}

/// Whether an invocation opens a run or continues one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invocation {
    Start,
    Continue,
}

/// What the orchestrator asked the data phase to do
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub invocation: Invocation,
    pub mode: SyncMode,
    /// Caller-supplied floor for incremental extraction
    pub extract_from: Option<DateTime<Utc>>,
    /// Walk from `extract_from` or the beginning instead of the last
    /// successful sync
    pub reset_extract_from: bool,
}

impl ExtractionRequest {
    /// Request opening a new run
    pub fn start(mode: SyncMode) -> Self {
        Self {
            invocation: Invocation::Start,
            mode,
            extract_from: None,
            reset_extract_from: false,
        }
    }

    /// Request continuing the current run
    pub fn resume() -> Self {
        Self {
            invocation: Invocation::Continue,
            ..Self::start(SyncMode::Full)
        }
    }

    /// Set the incremental floor
    #[must_use]
    pub fn with_extract_from(mut self, from: Option<DateTime<Utc>>) -> Self {
        self.extract_from = from;
        self
    }

    /// Set the reset flag
    #[must_use]
    pub fn with_reset_extract_from(mut self, reset: bool) -> Self {
        self.reset_extract_from = reset;
        self
    }

    /// Check whether this opens a run
    pub fn is_start(&self) -> bool {
        self.invocation == Invocation::Start
    }
}

/// How a phase invocation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// Every record type is completed
    Done,
    /// Yielded voluntarily; re-invoke to continue
    Progress { percent: u8 },
    /// Rate limited; re-invoke after `seconds`
    Delayed { seconds: u64 },
    /// Stopped on a fatal error; the message names the record type
    Failed { message: String },
}

impl PhaseOutcome {
    /// Check whether the phase finished
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Item counts of one record type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ItemCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ItemCounts {
    /// Total items seen
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }
}

/// Per record type item counts of one invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ItemReport {
    pub record_types: BTreeMap<RecordType, ItemCounts>,
}

impl ItemReport {
    /// Create an empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts of a record type
    pub fn get(&self, record_type: RecordType) -> ItemCounts {
        self.record_types
            .get(&record_type)
            .copied()
            .unwrap_or_default()
    }

    /// Add succeeded items
    pub fn add_succeeded(&mut self, record_type: RecordType, count: usize) {
        self.record_types.entry(record_type).or_default().succeeded += count;
    }

    /// Add failed items
    pub fn add_failed(&mut self, record_type: RecordType, count: usize) {
        self.record_types.entry(record_type).or_default().failed += count;
    }

    /// Add skipped items
    pub fn add_skipped(&mut self, record_type: RecordType, count: usize) {
        self.record_types.entry(record_type).or_default().skipped += count;
    }

    /// Check whether nothing was counted
    pub fn is_empty(&self) -> bool {
        self.record_types.values().all(|c| c.total() == 0)
    }
}

/// Item counts of an extraction invocation
pub type ExtractionReport = ItemReport;

/// Result of one data phase invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseResult {
    pub outcome: PhaseOutcome,
    pub report: ExtractionReport,
    /// Pages fetched during this invocation
    pub pages_fetched: usize,
}
