//! HTTP client module
//!
//! Provides the HTTP client and the classifier for failed calls.
//!
//! # Features
//!
//! - **Transport Retries**: Optional retries with backoff for 5xx and
//!   connection failures
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Classification**: Turns failures into `RetryAfter` or `Fatal`

mod classify;
mod client;

pub use classify::{retry_after_secs, Classifier, ErrorClass};
pub use client::{parse_json, HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
