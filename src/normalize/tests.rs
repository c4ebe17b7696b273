//! Tests for normalization

use super::*;
use crate::asana::AsanaRef;
use crate::pagination::testing::{task, user};
use chrono::TimeZone;
use pretty_assertions::assert_eq;
use serde_json::json;

fn ctx() -> NormalizeContext {
    NormalizeContext {
        app_base: "https://app.asana.com/0/".to_string(),
        project_id: "p1".to_string(),
        extracted_at: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
    }
}

fn full_task() -> AsanaTask {
    AsanaTask {
        gid: "t1".to_string(),
        name: Some("Ship it".to_string()),
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        modified_at: Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()),
        assignee: Some(AsanaRef {
            gid: "u9".to_string(),
            resource_type: Some("user".to_string()),
        }),
        html_notes: Some("<body>notes</body>".to_string()),
        attachments: vec![],
    }
}

#[test]
fn test_normalize_task() {
    let item = normalize_task(&full_task(), &ctx());

    assert_eq!(item.id, "t1");
    assert_eq!(item.modified_date, Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());
    assert_eq!(
        item.data,
        TaskData {
            name: Some("Ship it".to_string()),
            assignee: Some("u9".to_string()),
            description: Some(vec!["<body>notes</body>".to_string()]),
            item_url_field: Some("https://app.asana.com/0/p1/t1".to_string()),
        }
    );
}

#[test]
fn test_normalize_task_sparse_fields() {
    let mut task = full_task();
    task.name = Some(String::new());
    task.assignee = None;
    task.html_notes = None;
    task.modified_at = None;

    let item = normalize_task(&task, &ctx());
    assert_eq!(item.data.name, None);
    assert_eq!(item.data.assignee, None);
    assert_eq!(item.data.description, None);
    assert_eq!(item.modified_date, item.created_date);
}

#[test]
fn test_normalize_task_serializes_rfc3339() {
    let value = serde_json::to_value(normalize_task(&full_task(), &ctx())).unwrap();
    assert_eq!(value["created_date"], "2024-01-01T00:00:00Z");
    assert_eq!(value["data"]["assignee"], "u9");
}

#[test]
fn test_normalize_user_uses_extraction_time() {
    let user = AsanaUser {
        gid: "u1".to_string(),
        name: Some("Ada".to_string()),
        email: None,
    };
    let item = normalize_user(&user, &ctx());
    assert_eq!(item.created_date, ctx().extracted_at);
    assert_eq!(item.modified_date, ctx().extracted_at);
    assert_eq!(item.data.name.as_deref(), Some("Ada"));
    assert_eq!(item.data.email, None);
}

#[test]
fn test_normalize_attachment() {
    let attachment = AsanaAttachment {
        gid: "a1".to_string(),
        name: Some("file.png".to_string()),
        size: Some(10),
        download_url: Some("https://files/a1".to_string()),
    };
    assert_eq!(
        normalize_attachment(&attachment, "t1"),
        NormalizedAttachment {
            id: "a1".to_string(),
            url: Some("https://files/a1".to_string()),
            file_name: Some("file.png".to_string()),
            parent_id: "t1".to_string(),
        }
    );
}

#[test]
fn test_normalize_task_page_groups_attachments() {
    let page = Page::new(vec![task("t1", &["a1", "a2"]), task("t2", &[])], None);
    let groups = normalize_page(RecordType::Tasks, &page, &ctx());

    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].0, RecordType::Tasks);
    assert_eq!(groups[0].1.len(), 2);
    assert_eq!(groups[1].0, RecordType::Attachments);
    let ids: Vec<_> = groups[1].1.iter().map(NormalizedRecord::id).collect();
    assert_eq!(ids, vec!["a1", "a2"]);
    assert!(groups[1]
        .1
        .iter()
        .all(|r| r.record_type() == RecordType::Attachments));
}

#[test]
fn test_normalize_user_page_has_no_dependents() {
    let page = Page::new(vec![user("u1")], None);
    let groups = normalize_page(RecordType::Users, &page, &ctx());
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].1[0].record_type(), RecordType::Users);
}

#[test]
fn test_loader_item_deserializes_assignee_refs() {
    let item: LoaderItem = serde_json::from_value(json!({
        "id": {"devrev": "don:issue/1", "external": "123"},
        "data": {
            "name": "Task",
            "assignee": {"external": "u1"},
            "description": {"content": ["hello"]}
        }
    }))
    .unwrap();
    assert_eq!(item.id.external.as_deref(), Some("123"));
    assert_eq!(item.data.assignee, Some(AssigneeRef::External("u1".to_string())));

    let item: LoaderItem = serde_json::from_value(json!({
        "id": {"devrev": "don:issue/2"},
        "data": {"assignee": {"devrev": "don:user/7"}}
    }))
    .unwrap();
    assert_eq!(
        item.data.assignee,
        Some(AssigneeRef::Unresolved("don:user/7".to_string()))
    );
}

fn loader_item(assignee: Option<AssigneeRef>) -> LoaderItem {
    LoaderItem {
        id: ItemIds {
            devrev: "don:issue/1".to_string(),
            external: None,
        },
        created_date: None,
        modified_date: None,
        data: LoaderTaskData {
            name: Some("Write tests".to_string()),
            assignee,
            description: Some(RichText {
                content: vec!["first".to_string(), "second".to_string()],
            }),
        },
    }
}

#[test]
fn test_denormalize_task_for_create() {
    let payload = denormalize_task(
        &loader_item(Some(AssigneeRef::External("u1".to_string()))),
        Some("p1"),
    );
    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        json!({"data": {
            "name": "Write tests",
            "assignee": "u1",
            "notes": "first",
            "projects": ["p1"]
        }})
    );
}

#[test]
fn test_denormalize_task_unresolved_assignee_clears() {
    let payload = denormalize_task(
        &loader_item(Some(AssigneeRef::Unresolved("don:user/1".to_string()))),
        None,
    );
    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        json!({"data": {"name": "Write tests", "assignee": null, "notes": "first"}})
    );
}

#[test]
fn test_denormalize_task_defaults() {
    let mut item = loader_item(None);
    item.data.name = None;
    item.data.description = None;

    let payload = denormalize_task(&item, None);
    assert_eq!(
        serde_json::to_value(&payload).unwrap(),
        json!({"data": {"name": "", "notes": ""}})
    );
}
