//! Common types used throughout the connector
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// Sync Mode
// ============================================================================

/// Synchronization mode carried on the triggering event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SyncMode {
    /// Walk everything
    #[default]
    Full,
    /// Only changes since the last successful sync
    Incremental,
}

// ============================================================================
// Record Types
// ============================================================================

/// A category of synchronized entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Users,
    Tasks,
    Attachments,
}

impl RecordType {
    /// Extraction priority order. Users come first so task assignees resolve.
    pub const ALL: [RecordType; 3] = [RecordType::Users, RecordType::Tasks, RecordType::Attachments];

    /// Item type name used on the wire and in the sink
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::Users => "users",
            RecordType::Tasks => "tasks",
            RecordType::Attachments => "attachments",
        }
    }

    /// Record types completed in the same checkpoint write as `self`.
    ///
    /// This is the single place deciding joint completion: attachments are
    /// found embedded in task pages, so exhausting tasks exhausts them too.
    pub fn jointly_completed(self) -> &'static [RecordType] {
        match self {
            RecordType::Tasks => &[RecordType::Attachments],
            RecordType::Users | RecordType::Attachments => &[],
        }
    }

    /// The record type whose pages produce this one, if it has no
    /// pagination of its own.
    pub fn derived_from(self) -> Option<RecordType> {
        RecordType::ALL
            .into_iter()
            .find(|owner| owner.jointly_completed().contains(&self))
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for transport retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}

impl OptionStringExt for String {
    fn none_if_empty(self) -> Option<String> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}
