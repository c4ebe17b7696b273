//! Tests for the output module

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;

// ============================================================================
// MemorySink Tests
// ============================================================================

#[tokio::test]
async fn test_memory_sink_keeps_push_order() {
    let mut sink = MemorySink::new();
    sink.push("users", vec![json!({"id": "u1"}), json!({"id": "u2"})])
        .await
        .unwrap();
    sink.push("tasks", vec![json!({"id": "t1"})]).await.unwrap();
    sink.push("attachments", vec![]).await.unwrap();
    sink.push("users", vec![json!({"id": "u3"})]).await.unwrap();

    assert_eq!(sink.len(), 4);
    assert_eq!(sink.item_sequence(), vec!["users", "users", "tasks", "users"]);
    assert_eq!(sink.items("users").len(), 3);
    assert_eq!(sink.items("users")[2], &json!({"id": "u3"}));
    assert_eq!(sink.batches().len(), 4);
}

#[test]
fn test_memory_sink_empty() {
    let sink = MemorySink::new();
    assert!(sink.is_empty());
    assert!(sink.items("tasks").is_empty());
}

// ============================================================================
// JsonLinesSink Tests
// ============================================================================

#[tokio::test]
async fn test_json_lines_sink_writes_one_file_per_type() {
    let dir = tempdir().unwrap();
    let mut sink = JsonLinesSink::new(dir.path().join("out")).unwrap();

    sink.push("tasks", vec![json!({"id": "t1"}), json!({"id": "t2"})])
        .await
        .unwrap();
    sink.push("users", vec![json!({"id": "u1"})]).await.unwrap();
    sink.push("tasks", vec![json!({"id": "t3"})]).await.unwrap();

    let tasks = std::fs::read_to_string(sink.path_for("tasks")).unwrap();
    let ids: Vec<String> = tasks
        .lines()
        .map(|line| serde_json::from_str::<serde_json::Value>(line).unwrap()["id"].to_string())
        .collect();
    assert_eq!(ids, vec!["\"t1\"", "\"t2\"", "\"t3\""]);

    assert_eq!(sink.rows_written().get("tasks"), Some(&3));
    assert_eq!(sink.rows_written().get("users"), Some(&1));
}

#[tokio::test]
async fn test_json_lines_sink_appends_across_instances() {
    let dir = tempdir().unwrap();

    let mut first = JsonLinesSink::new(dir.path()).unwrap();
    first.push("users", vec![json!({"id": "u1"})]).await.unwrap();

    let mut second = JsonLinesSink::new(dir.path()).unwrap();
    second.push("users", vec![json!({"id": "u2"})]).await.unwrap();

    let contents = std::fs::read_to_string(dir.path().join("users.jsonl")).unwrap();
    assert_eq!(contents.lines().count(), 2);
}

#[tokio::test]
async fn test_json_lines_sink_skips_empty_batches() {
    let dir = tempdir().unwrap();
    let mut sink = JsonLinesSink::new(dir.path()).unwrap();
    sink.push("attachments", vec![]).await.unwrap();
    assert!(!sink.path_for("attachments").exists());
}

#[test]
fn test_path_for_sanitizes_item_type() {
    let dir = tempdir().unwrap();
    let sink = JsonLinesSink::new(dir.path()).unwrap();
    assert_eq!(
        sink.path_for("../evil.type"),
        dir.path().join("___evil_type.jsonl")
    );
}
