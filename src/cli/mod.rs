//! CLI module
//!
//! Command-line interface for running the connector locally.
//!
//! # Commands
//!
//! - `handle` - Run one event from a file, optionally following it to the end
//! - `discover` - List projects as sync units
//! - `metadata` - Print the external domain metadata
//! - `extract` - Extract a project into JSON-lines files
//! - `load` - Load tasks and attachments into a project
//! - `serve` - Start HTTP server mode

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands, Credentials, ModeArg};
pub use runner::{invoke, invoke_in_memory, Runner};
pub use server::{router, serve, ServerConfig};
