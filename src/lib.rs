//! # Asana Airdrop connector
//!
//! Synchronizes Asana users, tasks and attachments with the Airdrop
//! platform, and loads platform tasks and attachments back into Asana.
//!
//! ## Features
//!
//! - **Resumable extraction**: every invocation picks up from the
//!   checkpoint left by the previous one, page by page
//! - **Incremental sync**: narrows tasks by modification time
//! - **Rate limits**: a 429 suspends the phase with the delay the server asks for
//! - **Loading**: creates or updates tasks and links attachments to them
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use asana_airdrop::{AirdropEvent, Checkpoint, Connector, ConnectorConfig, MemorySink};
//!
//! #[tokio::main]
//! async fn main() -> asana_airdrop::Result<()> {
//!     let connector = Connector::new(ConnectorConfig::default());
//!     let event: AirdropEvent = serde_json::from_str(&std::fs::read_to_string("event.json")?)?;
//!
//!     let mut checkpoint = Checkpoint::fresh();
//!     let mut sink = MemorySink::new();
//!     let signal = connector.handle(&event, &mut checkpoint, &mut sink, None).await;
//!     println!("{}", serde_json::to_string(&signal)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 Connector (one event → one signal)              │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────┬──────────────┬───┴────────┬─────────────┬───────────┐
//! │ Discovery │ Phase Runner │  Loader    │ Normalizer  │  Output   │
//! ├───────────┼──────────────┼────────────┼─────────────┼───────────┤
//! │ Projects  │ Checkpoint   │ Tasks      │ Tasks       │ Memory    │
//! │ Counts    │ Pagination   │ Attachment │ Users       │ JSON lines│
//! │           │ Classifier   │ linking    │ Attachments │           │
//! └───────────┴──────────────┴────────────┴─────────────┴───────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the connector
pub mod error;

/// Common types and type aliases
pub mod types;

/// Connector configuration
pub mod config;

/// HTTP client and failure classification
pub mod http;

/// Asana API records and client
pub mod asana;

/// Page-by-page listing
pub mod pagination;

/// Checkpoints and their persistence
pub mod state;

/// Conversion between Asana records and platform items
pub mod normalize;

/// Extraction phase runner
pub mod engine;

/// External sync unit discovery
pub mod discovery;

/// Loading into Asana
pub mod loading;

/// Inbound events and outbound signals
pub mod event;

/// Item sinks
pub mod output;

/// Event dispatcher
pub mod connector;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use config::ConnectorConfig;
pub use connector::Connector;
pub use event::{AirdropEvent, Signal, SignalType};
pub use output::{ItemSink, JsonLinesSink, MemorySink};
pub use state::{Checkpoint, StateManager};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
