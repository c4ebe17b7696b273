//! Scripted paginator for tests

use super::{Page, PageFilters, Paginator};
use crate::asana::{AsanaAttachment, AsanaTask, AsanaUser, ExternalRecord};
use crate::error::{Error, Result};
use crate::types::RecordType;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use std::collections::HashMap;
use std::sync::Mutex;

/// What a scripted call answers with
#[derive(Debug, Clone)]
pub enum Scripted {
    Page(Page),
    Status { status: u16, retry_after: Option<String> },
}

/// One recorded `fetch_page` call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub record_type: RecordType,
    pub cursor: Option<String>,
    pub filters: PageFilters,
}

/// Answers `fetch_page` from a script keyed by record type and cursor
#[derive(Debug, Default)]
pub struct ScriptedPaginator {
    script: HashMap<(RecordType, Option<String>), Scripted>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedPaginator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(
        mut self,
        record_type: RecordType,
        cursor: Option<&str>,
        records: Vec<ExternalRecord>,
        next: Option<&str>,
    ) -> Self {
        self.script.insert(
            (record_type, cursor.map(String::from)),
            Scripted::Page(Page::new(records, next.map(String::from))),
        );
        self
    }

    pub fn status(
        mut self,
        record_type: RecordType,
        cursor: Option<&str>,
        status: u16,
        retry_after: Option<&str>,
    ) -> Self {
        self.script.insert(
            (record_type, cursor.map(String::from)),
            Scripted::Status {
                status,
                retry_after: retry_after.map(String::from),
            },
        );
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, record_type: RecordType) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.record_type == record_type)
            .collect()
    }
}

#[async_trait]
impl Paginator for ScriptedPaginator {
    async fn fetch_page(
        &self,
        record_type: RecordType,
        cursor: Option<&str>,
        filters: &PageFilters,
    ) -> Result<Page> {
        self.calls.lock().unwrap().push(Call {
            record_type,
            cursor: cursor.map(String::from),
            filters: filters.clone(),
        });

        match self.script.get(&(record_type, cursor.map(String::from))) {
            Some(Scripted::Page(page)) => Ok(page.clone()),
            Some(Scripted::Status {
                status,
                retry_after,
            }) => {
                let mut headers = HeaderMap::new();
                if let Some(value) = retry_after {
                    headers.insert(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
                }
                Err(Error::HttpStatus {
                    status: *status,
                    body: "scripted failure".to_string(),
                    headers,
                })
            }
            None => panic!("unscripted fetch: {record_type} at {cursor:?}"),
        }
    }
}

pub fn user(gid: &str) -> ExternalRecord {
    ExternalRecord::User(AsanaUser {
        gid: gid.to_string(),
        name: Some(format!("User {gid}")),
        email: Some(format!("{gid}@example.com")),
    })
}

pub fn task(gid: &str, attachments: &[&str]) -> ExternalRecord {
    ExternalRecord::Task(AsanaTask {
        gid: gid.to_string(),
        name: Some(format!("Task {gid}")),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        modified_at: Some(Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()),
        assignee: None,
        html_notes: None,
        attachments: attachments
            .iter()
            .map(|gid| AsanaAttachment {
                gid: (*gid).to_string(),
                name: Some(format!("{gid}.txt")),
                size: Some(1),
                download_url: Some(format!("https://files.example.com/{gid}")),
            })
            .collect(),
    })
}
