//! Pagination types and traits
//!
//! Defines the page abstraction driven by the phase runner.

use crate::asana::{ExternalRecord, ListResponse, NextPageRef};
use crate::error::Result;
use crate::types::{OptionStringExt, RecordType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// One page of raw external records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Records in the order the remote returned them
    pub records: Vec<ExternalRecord>,
    /// Opaque continuation token; `None` means the walk is over
    pub next_cursor: Option<String>,
}

impl Page {
    /// Create a page
    pub fn new(records: Vec<ExternalRecord>, next_cursor: Option<String>) -> Self {
        Self {
            records,
            next_cursor: next_cursor.none_if_empty(),
        }
    }

    /// Build a page from an Asana list envelope
    pub fn from_list<T>(list: ListResponse<T>, wrap: impl Fn(T) -> ExternalRecord) -> Self {
        let next_cursor = next_offset(list.next_page.as_ref());
        Self::new(list.data.into_iter().map(wrap).collect(), next_cursor)
    }

    /// True when this page ends the cursor chain
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }

    /// Number of records in the page
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the page has no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Extra narrowing applied to a page request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFilters {
    /// Only records modified at or after this instant
    pub modified_since: Option<DateTime<Utc>>,
}

impl PageFilters {
    /// No narrowing
    pub fn none() -> Self {
        Self::default()
    }

    /// Narrow by modification time
    pub fn modified_since(since: DateTime<Utc>) -> Self {
        Self {
            modified_since: Some(since),
        }
    }
}

/// Offset token extracted from a continuation block
pub fn next_offset(next_page: Option<&NextPageRef>) -> Option<String> {
    next_page.and_then(|n| n.offset.clone()).none_if_empty()
}

/// Fetches one page of a record type
///
/// `cursor` must be exactly the token returned by the previous call, or
/// `None` to start from the beginning. Errors are surfaced unclassified.
#[async_trait]
pub trait Paginator: Send + Sync {
    /// Fetch the page at `cursor`
    async fn fetch_page(
        &self,
        record_type: RecordType,
        cursor: Option<&str>,
        filters: &PageFilters,
    ) -> Result<Page>;
}
