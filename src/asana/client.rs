//! Asana REST client
//!
//! Thin typed wrapper over [`HttpClient`] for the endpoints the connector
//! uses. It implements the seams the rest of the crate is written against:
//! [`Paginator`] for extraction, [`ProjectDirectory`] for discovery and
//! [`RemoteWriter`] for loading.

use super::types::{
    AsanaProject, AsanaTask, AsanaUser, DataResponse, ExternalRecord, ListResponse, TaskCounts,
};
use crate::config::ConnectorConfig;
use crate::discovery::ProjectDirectory;
use crate::error::{Error, Result};
use crate::http::{parse_json, HttpClient, RequestConfig};
use crate::loading::RemoteWriter;
use crate::normalize::{LoaderAttachment, TaskPayload};
use crate::pagination::{next_offset, Page, PageFilters, Paginator};
use crate::types::RecordType;
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::multipart::Form;
use reqwest::Method;
use serde::Deserialize;
use tracing::debug;

/// Fields requested for tasks, embedded attachments included
pub const TASK_FIELDS: &str = "name,created_at,modified_at,assignee,attachments.name,attachments.size,attachments.download_url,html_notes";

/// Fields requested for users
pub const USER_FIELDS: &str = "name,email";

/// Fields returned for a created attachment
const ATTACHMENT_FIELDS: &str = "connected_to_app,created_at,download_url,host,name,parent,parent.created_by,parent.name,parent.resource_subtype,permanent_url,resource_subtype,size,view_url";

/// Client scoped to one workspace and one project (the sync unit)
#[derive(Debug)]
pub struct AsanaClient {
    http: HttpClient,
    workspace_id: String,
    project_id: String,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
struct Gid {
    gid: String,
}

impl AsanaClient {
    /// Build a client authenticated with a personal access token
    pub fn new(
        config: &ConnectorConfig,
        api_key: &str,
        workspace_id: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::missing_field("connection_data.key"));
        }

        let mut http_config = config.http_client_config();
        http_config
            .default_headers
            .insert("authorization".to_string(), format!("Bearer {api_key}"));

        Ok(Self {
            http: HttpClient::with_config(http_config)?,
            workspace_id: workspace_id.into(),
            project_id: project_id.into(),
            page_size: config.page_size,
        })
    }

    /// Project the client is scoped to
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    /// Workspace the client is scoped to
    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    /// One page of workspace users
    pub async fn get_users(&self, offset: Option<&str>) -> Result<ListResponse<AsanaUser>> {
        let request = RequestConfig::new()
            .query("limit", self.page_size.to_string())
            .query("workspace", &self.workspace_id)
            .query("opt_fields", USER_FIELDS)
            .query_opt("offset", offset);

        self.http.get_json_with_config("/users", request).await
    }

    /// One page of the project's tasks
    pub async fn get_tasks(
        &self,
        offset: Option<&str>,
        filters: &PageFilters,
    ) -> Result<ListResponse<AsanaTask>> {
        let modified_since = filters
            .modified_since
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Millis, true));

        let request = RequestConfig::new()
            .query("limit", self.page_size.to_string())
            .query("opt_fields", TASK_FIELDS)
            .query_opt("offset", offset)
            .query_opt("modified_since", modified_since);

        let url = format!("/projects/{}/tasks", self.project_id);
        self.http.get_json_with_config(&url, request).await
    }

    async fn list_projects_page(&self, offset: Option<&str>) -> Result<ListResponse<AsanaProject>> {
        let request = RequestConfig::new()
            .query("limit", self.page_size.to_string())
            .query_opt("offset", offset);

        let url = format!("/workspaces/{}/projects", self.workspace_id);
        self.http.get_json_with_config(&url, request).await
    }

    async fn send_task(&self, method: Method, url: &str, payload: &TaskPayload) -> Result<String> {
        let body = serde_json::to_value(payload)?;
        let created: DataResponse<Gid> = self
            .http
            .request_json(method, url, RequestConfig::new().json(body))
            .await?;
        Ok(created.data.gid)
    }
}

#[async_trait]
impl Paginator for AsanaClient {
    async fn fetch_page(
        &self,
        record_type: RecordType,
        cursor: Option<&str>,
        filters: &PageFilters,
    ) -> Result<Page> {
        debug!(%record_type, ?cursor, "Fetching page");
        match record_type {
            RecordType::Users => Ok(Page::from_list(
                self.get_users(cursor).await?,
                ExternalRecord::User,
            )),
            RecordType::Tasks => Ok(Page::from_list(
                self.get_tasks(cursor, filters).await?,
                ExternalRecord::Task,
            )),
            RecordType::Attachments => Err(Error::Other(
                "attachments are extracted from task pages and have no endpoint of their own"
                    .to_string(),
            )),
        }
    }
}

#[async_trait]
impl ProjectDirectory for AsanaClient {
    async fn list_projects(&self) -> Result<Vec<AsanaProject>> {
        let mut projects = Vec::new();
        let mut offset: Option<String> = None;

        loop {
            let page = self.list_projects_page(offset.as_deref()).await?;
            projects.extend(page.data);
            offset = next_offset(page.next_page.as_ref());
            if offset.is_none() {
                break;
            }
        }

        Ok(projects)
    }

    async fn task_count(&self, project_gid: &str) -> Result<Option<u64>> {
        let url = format!("/projects/{project_gid}/task_counts");
        let counts: DataResponse<TaskCounts> = self
            .http
            .get_json_with_config(&url, RequestConfig::new().query("opt_fields", "num_tasks"))
            .await?;
        Ok(counts.data.num_tasks)
    }
}

#[async_trait]
impl RemoteWriter for AsanaClient {
    async fn create_task(&self, payload: &TaskPayload) -> Result<String> {
        self.send_task(Method::POST, "/tasks", payload).await
    }

    async fn update_task(&self, task_id: &str, payload: &TaskPayload) -> Result<String> {
        self.send_task(Method::PUT, &format!("/tasks/{task_id}"), payload)
            .await
    }

    async fn create_attachment(
        &self,
        attachment: &LoaderAttachment,
        parent_task_id: &str,
    ) -> Result<String> {
        let form = Form::new()
            .text("resource_subtype", "external")
            .text("parent", parent_task_id.to_string())
            .text("url", attachment.url.clone())
            .text("name", attachment.file_name.clone())
            .text("connect_to_app", "true")
            .text("opt_fields", ATTACHMENT_FIELDS);

        let response = self.http.post_multipart("/attachments", form).await?;
        let created: DataResponse<Gid> = parse_json(response).await?;
        Ok(created.data.gid)
    }
}
