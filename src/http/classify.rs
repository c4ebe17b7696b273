//! Rate-limit / error classification
//!
//! Labels a failed remote call so callers know whether to suspend with a
//! delay or give up on the phase. Nothing here retries or sleeps; scheduling
//! the retry is the orchestrator's job.

use crate::error::Error;
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Maximum number of body characters embedded in a fatal message
const BODY_FRAGMENT_CHARS: usize = 200;

/// Classification of a failed remote call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorClass {
    /// The remote rate limited us; try again after this many seconds
    RetryAfter(u64),
    /// Anything else; the message is safe to surface upward
    Fatal(String),
}

impl ErrorClass {
    /// Check if this is a rate-limit classification
    pub fn is_retry_after(&self) -> bool {
        matches!(self, Self::RetryAfter(_))
    }
}

/// Classifies errors into [`ErrorClass`]
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    default_retry_after_secs: u64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            default_retry_after_secs: 60,
        }
    }
}

impl Classifier {
    /// Create a classifier. A zero default is bumped to one second so a
    /// missing header can never produce a tight retry loop.
    pub fn new(default_retry_after_secs: u64) -> Self {
        Self {
            default_retry_after_secs: default_retry_after_secs.max(1),
        }
    }

    /// Delay used when a 429 carries no usable `Retry-After`
    pub fn default_retry_after_secs(&self) -> u64 {
        self.default_retry_after_secs
    }

    /// Classify an error
    pub fn classify(&self, error: &Error) -> ErrorClass {
        match error {
            Error::HttpStatus {
                status: 429,
                headers,
                ..
            } => ErrorClass::RetryAfter(
                retry_after_secs(headers, Utc::now()).unwrap_or(self.default_retry_after_secs),
            ),
            Error::HttpStatus { status, body, .. } => {
                let fragment = body_fragment(body);
                if fragment.is_empty() {
                    ErrorClass::Fatal(format!("HTTP {status}"))
                } else {
                    ErrorClass::Fatal(format!("HTTP {status}: {fragment}"))
                }
            }
            Error::Http(e) if e.status().is_some_and(|s| s.as_u16() == 429) => {
                ErrorClass::RetryAfter(self.default_retry_after_secs)
            }
            other => ErrorClass::Fatal(redact(&other.to_string())),
        }
    }
}

/// Read `Retry-After` as delta-seconds or as an HTTP-date
pub fn retry_after_secs(headers: &HeaderMap, now: DateTime<Utc>) -> Option<u64> {
    let value = headers.get(RETRY_AFTER)?.to_str().ok()?.trim();

    if let Ok(seconds) = value.parse::<u64>() {
        return Some(seconds);
    }

    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    let seconds = (at - now).num_seconds().max(1);
    Some(seconds as u64)
}

/// First characters of a response body, single line, secrets masked
fn body_fragment(body: &str) -> String {
    let collapsed: String = body.split_whitespace().collect::<Vec<_>>().join(" ");
    let fragment: String = collapsed.chars().take(BODY_FRAGMENT_CHARS).collect();
    let fragment = redact(&fragment);
    if collapsed.chars().count() > BODY_FRAGMENT_CHARS {
        format!("{fragment}...")
    } else {
        fragment
    }
}

/// Mask bearer tokens that a remote might echo back
fn redact(text: &str) -> String {
    let mut out = Vec::new();
    let mut mask_next = false;
    for word in text.split(' ') {
        if mask_next && !word.is_empty() {
            out.push("[REDACTED]");
            mask_next = false;
            continue;
        }
        mask_next = word.eq_ignore_ascii_case("bearer");
        out.push(word);
    }
    out.join(" ")
}
