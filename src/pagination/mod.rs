//! Pagination module
//!
//! Asana lists are walked with an opaque `offset` token: each response
//! carries the token of the next page, and a missing token ends the walk.
//!
//! # Overview
//!
//! - `Page` - one batch of raw records plus the next cursor
//! - `PageFilters` - incremental narrowing (modified since)
//! - `Paginator` - the trait the phase runner drives

mod types;

pub use types::{next_offset, Page, PageFilters, Paginator};

#[cfg(test)]
pub(crate) mod testing;
