//! State management module
//!
//! Handles cursor tracking, checkpointing, and resumability.
//! The checkpoint is persisted between invocations so an interrupted run
//! picks up at the exact record type and cursor where it stopped.
//!
//! # Overview
//!
//! The state module provides:
//! - `Checkpoint` - Per-record-type progress plus run watermarks
//! - `StateManager` - File-based checkpoint persistence
//! - `CheckpointStore` - Hook for flushing while a phase runs

mod manager;
mod types;

pub use manager::{CheckpointStore, StateManager};
pub use types::{Checkpoint, LoaderCursor, RecordTypeState};

#[cfg(test)]
mod manager_tests;
