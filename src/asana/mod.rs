//! Asana API module
//!
//! Typed records for the Asana endpoints the connector reads and writes,
//! and the client that calls them.

mod client;
mod types;

pub use client::{AsanaClient, TASK_FIELDS, USER_FIELDS};
pub use types::{
    AsanaAttachment, AsanaProject, AsanaRef, AsanaTask, AsanaUser, DataResponse, ExternalRecord,
    ListResponse, NextPageRef, TaskCounts,
};
