//! Output module
//!
//! Sinks that collect normalized items during extraction.
//!
//! # Overview
//!
//! This module provides:
//! - `ItemSink` - The push-only collector trait the phase runner writes to
//! - `MemorySink` - Keeps batches in memory (serve mode, tests)
//! - `JsonLinesSink` - Appends items to `{item_type}.jsonl` files

mod sink;
mod writer;

pub use sink::{ItemSink, MemorySink};
pub use writer::JsonLinesSink;

#[cfg(test)]
mod tests;
