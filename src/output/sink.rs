//! Item sinks
//!
//! A sink is the push-only collector extraction hands normalized items to.
//! Items are grouped by item type name (`users`, `tasks`, `attachments`,
//! `external_domain_metadata`).

use crate::error::Result;
use crate::types::JsonValue;
use async_trait::async_trait;

/// Push-only collector of normalized items
#[async_trait]
pub trait ItemSink: Send {
    /// Append a batch of items of one item type, preserving order
    async fn push(&mut self, item_type: &str, items: Vec<JsonValue>) -> Result<()>;
}

/// Sink that keeps every batch in memory, in push order
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    batches: Vec<(String, Vec<JsonValue>)>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches in the order they were pushed
    pub fn batches(&self) -> &[(String, Vec<JsonValue>)] {
        &self.batches
    }

    /// All items of one item type, in push order
    pub fn items(&self, item_type: &str) -> Vec<&JsonValue> {
        self.batches
            .iter()
            .filter(|(name, _)| name == item_type)
            .flat_map(|(_, items)| items.iter())
            .collect()
    }

    /// Item type of every pushed item, in push order
    pub fn item_sequence(&self) -> Vec<&str> {
        self.batches
            .iter()
            .flat_map(|(name, items)| std::iter::repeat(name.as_str()).take(items.len()))
            .collect()
    }

    /// Total number of items pushed
    pub fn len(&self) -> usize {
        self.batches.iter().map(|(_, items)| items.len()).sum()
    }

    /// Check whether nothing has been pushed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Take every batch out of the sink
    pub fn into_batches(self) -> Vec<(String, Vec<JsonValue>)> {
        self.batches
    }
}

#[async_trait]
impl ItemSink for MemorySink {
    async fn push(&mut self, item_type: &str, items: Vec<JsonValue>) -> Result<()> {
        self.batches.push((item_type.to_string(), items));
        Ok(())
    }
}
