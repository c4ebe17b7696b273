//! External sync unit discovery
//!
//! Lists the projects of the workspace as sync units. Task counts are an
//! enrichment fetched concurrently; a count that can't be fetched is left
//! out of that one unit and never fails discovery.

use crate::asana::AsanaProject;
use crate::error::Result;
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Item type every sync unit holds
pub const SYNC_UNIT_ITEM_TYPE: &str = "tasks";

/// Source of projects and their task counts
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Every project of the workspace
    async fn list_projects(&self) -> Result<Vec<AsanaProject>>;

    /// Number of tasks in a project, when the remote reports it
    async fn task_count(&self, project_gid: &str) -> Result<Option<u64>>;
}

/// A collection root the platform can sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalSyncUnit {
    pub id: String,
    pub name: String,
    pub description: String,
    pub item_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_count: Option<u64>,
}

impl ExternalSyncUnit {
    fn from_project(project: AsanaProject, item_count: Option<u64>) -> Self {
        Self {
            id: project.gid,
            name: project.name,
            description: project.resource_type.unwrap_or_default(),
            item_type: SYNC_UNIT_ITEM_TYPE.to_string(),
            item_count,
        }
    }
}

/// Discover sync units. Fails only when the project list itself fails.
pub async fn discover_sync_units(directory: &dyn ProjectDirectory) -> Result<Vec<ExternalSyncUnit>> {
    let projects = directory.list_projects().await?;

    let counts = join_all(projects.iter().map(|project| async move {
        match directory.task_count(&project.gid).await {
            Ok(count) => count,
            Err(err) => {
                warn!(project = %project.gid, error = %err, "Failed to fetch task count, omitting it");
                None
            }
        }
    }))
    .await;

    let units: Vec<_> = projects
        .into_iter()
        .zip(counts)
        .map(|(project, count)| ExternalSyncUnit::from_project(project, count))
        .collect();

    info!(count = units.len(), "Discovered external sync units");
    Ok(units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::collections::HashMap;

    struct StaticDirectory {
        projects: Vec<AsanaProject>,
        counts: HashMap<String, Result<Option<u64>>>,
        list_fails: bool,
    }

    fn project(gid: &str) -> AsanaProject {
        AsanaProject {
            gid: gid.to_string(),
            name: format!("Project {gid}"),
            resource_type: Some("project".to_string()),
        }
    }

    #[async_trait]
    impl ProjectDirectory for StaticDirectory {
        async fn list_projects(&self) -> Result<Vec<AsanaProject>> {
            if self.list_fails {
                return Err(Error::http_status(401, "Not Authorized"));
            }
            Ok(self.projects.clone())
        }

        async fn task_count(&self, project_gid: &str) -> Result<Option<u64>> {
            match self.counts.get(project_gid) {
                Some(Ok(count)) => Ok(*count),
                Some(Err(_)) | None => Err(Error::http_status(500, "boom")),
            }
        }
    }

    #[tokio::test]
    async fn test_failed_count_is_omitted_for_that_unit_only() {
        let directory = StaticDirectory {
            projects: vec![project("p1"), project("p2"), project("p3")],
            counts: HashMap::from([
                ("p1".to_string(), Ok(Some(12))),
                ("p3".to_string(), Ok(None)),
            ]),
            list_fails: false,
        };

        let units = discover_sync_units(&directory).await.unwrap();

        let counts: Vec<_> = units.iter().map(|u| (u.id.as_str(), u.item_count)).collect();
        assert_eq!(counts, vec![("p1", Some(12)), ("p2", None), ("p3", None)]);
        assert!(units.iter().all(|u| u.item_type == "tasks"));
    }

    #[tokio::test]
    async fn test_list_failure_fails_discovery() {
        let directory = StaticDirectory {
            projects: vec![],
            counts: HashMap::new(),
            list_fails: true,
        };
        assert!(discover_sync_units(&directory).await.is_err());
    }

    #[test]
    fn test_sync_unit_serialization() {
        let unit = ExternalSyncUnit::from_project(project("p1"), None);
        assert_eq!(
            serde_json::to_value(&unit).unwrap(),
            json!({
                "id": "p1",
                "name": "Project p1",
                "description": "project",
                "item_type": "tasks"
            })
        );
    }
}
