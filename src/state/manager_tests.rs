//! Tests for Checkpoint and StateManager

use super::*;
use crate::types::RecordType;
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;

// ============================================================================
// Checkpoint Tests
// ============================================================================

#[test]
fn test_fresh_checkpoint() {
    let checkpoint = Checkpoint::fresh();
    for rt in RecordType::ALL {
        assert!(!checkpoint.is_completed(rt));
        assert!(checkpoint.get(rt).cursor.is_none());
    }
    assert_eq!(checkpoint.completed_count(), 0);
    assert!(checkpoint.last_successful_sync_started.is_none());
}

#[test]
fn test_mark_tasks_completes_attachments() {
    let mut checkpoint = Checkpoint::fresh();
    let marked = checkpoint.mark_completed(RecordType::Tasks);

    assert_eq!(marked, vec![RecordType::Tasks, RecordType::Attachments]);
    assert!(checkpoint.is_completed(RecordType::Attachments));
    assert!(!checkpoint.is_completed(RecordType::Users));
}

#[test]
fn test_mark_users_completes_only_users() {
    let mut checkpoint = Checkpoint::fresh();
    assert_eq!(
        checkpoint.mark_completed(RecordType::Users),
        vec![RecordType::Users]
    );
    assert_eq!(checkpoint.completed_count(), 1);
}

#[test]
fn test_reset_record_types() {
    let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut checkpoint = Checkpoint::fresh();
    checkpoint.mark_completed(RecordType::Users);
    checkpoint.set_cursor(RecordType::Tasks, "abc");
    checkpoint.tasks.changed_since = Some(since);
    checkpoint.last_successful_sync_started = Some(since);

    checkpoint.reset_record_types();

    assert_eq!(checkpoint.users, RecordTypeState::default());
    assert_eq!(checkpoint.tasks, RecordTypeState::default());
    assert_eq!(checkpoint.last_successful_sync_started, Some(since));
}

#[test]
fn test_resume_cursor_ignores_empty_token() {
    let mut state = RecordTypeState::default();
    assert_eq!(state.resume_cursor(), None);
    state.cursor = Some(String::new());
    assert_eq!(state.resume_cursor(), None);
    state.cursor = Some("k".to_string());
    assert_eq!(state.resume_cursor(), Some("k"));
}

#[test]
fn test_checkpoint_serialization_layout() {
    let mut checkpoint = Checkpoint::fresh();
    checkpoint.set_cursor(RecordType::Users, "u1");
    checkpoint.last_successful_sync_started = Some(Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap());

    let value = serde_json::to_value(&checkpoint).unwrap();
    assert_eq!(value["users"], json!({"completed": false, "cursor": "u1"}));
    assert_eq!(value["lastSuccessfulSyncStarted"], "2024-05-01T00:00:00Z");
    assert_eq!(value["dataLoading"], json!({"nextIndex": 0}));
}

#[test]
fn test_checkpoint_reads_legacy_keys_and_ignores_unknown() {
    let checkpoint: Checkpoint = serde_json::from_value(json!({
        "users": {"completed": true},
        "tasks": {"completed": false, "offset": "xyz", "modifiedSince": "2024-01-01T00:00:00Z"},
        "somethingNew": 1
    }))
    .unwrap();

    assert!(checkpoint.users.completed);
    assert_eq!(checkpoint.tasks.cursor.as_deref(), Some("xyz"));
    assert!(checkpoint.tasks.changed_since.is_some());
    assert_eq!(checkpoint.attachments, RecordTypeState::default());
}

// ============================================================================
// Construction Tests
// ============================================================================

#[test]
fn test_state_manager_new() {
    let manager = StateManager::new("/tmp/test-state.json");
    assert!(!manager.is_in_memory());
    assert_eq!(manager.path().to_str().unwrap(), "/tmp/test-state.json");
}

#[test]
fn test_state_manager_in_memory() {
    let manager = StateManager::in_memory();
    assert!(manager.is_in_memory());
}

#[tokio::test]
async fn test_from_json() {
    let manager = StateManager::from_json(r#"{"users": {"completed": true}}"#).unwrap();
    assert!(manager.checkpoint().await.users.completed);
    assert!(manager.is_in_memory());
}

#[test]
fn test_from_json_invalid() {
    let result = StateManager::from_json("{not json");
    assert!(matches!(result, Err(crate::error::Error::State { .. })));
}

#[tokio::test]
async fn test_from_json_empty_is_fresh() {
    let manager = StateManager::from_json("  ").unwrap();
    assert_eq!(manager.checkpoint().await, Checkpoint::fresh());
}

// ============================================================================
// Persistence Tests
// ============================================================================

#[tokio::test]
async fn test_save_and_load_roundtrip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");

    let manager = StateManager::new(&path);
    let mut checkpoint = Checkpoint::fresh();
    checkpoint.mark_completed(RecordType::Users);
    checkpoint.set_cursor(RecordType::Tasks, "t1");
    manager.store(checkpoint.clone()).await.unwrap();

    assert!(path.exists());
    assert!(!path.with_extension("tmp").exists());

    let reloaded = StateManager::from_file(&path).unwrap();
    assert_eq!(reloaded.checkpoint().await, checkpoint);

    let lazy = StateManager::new(&path);
    lazy.load().await.unwrap();
    assert_eq!(lazy.checkpoint().await, checkpoint);
}

#[tokio::test]
async fn test_from_file_missing_is_fresh() {
    let dir = tempdir().unwrap();
    let manager = StateManager::from_file(dir.path().join("missing.json")).unwrap();
    assert_eq!(manager.checkpoint().await, Checkpoint::fresh());
}

#[tokio::test]
async fn test_in_memory_save_is_noop() {
    let manager = StateManager::in_memory();
    let mut checkpoint = Checkpoint::fresh();
    checkpoint.mark_completed(RecordType::Users);
    manager.store(checkpoint).await.unwrap();
    assert!(manager.checkpoint().await.users.completed);
}

#[tokio::test]
async fn test_flush_through_checkpoint_store() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.json");
    let manager = StateManager::new(&path);
    let store: &dyn CheckpointStore = &manager;

    let mut checkpoint = Checkpoint::fresh();
    checkpoint.set_cursor(RecordType::Users, "u2");
    store.flush(&checkpoint).await.unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert!(contents.contains("\"u2\""));
}

#[tokio::test]
async fn test_clone_shares_state() {
    let manager = StateManager::in_memory();
    let clone = manager.clone();

    let mut checkpoint = Checkpoint::fresh();
    checkpoint.set_cursor(RecordType::Users, "shared");
    clone.replace(checkpoint).await;

    assert_eq!(
        manager.checkpoint().await.users.cursor.as_deref(),
        Some("shared")
    );
}

#[tokio::test]
async fn test_clear() {
    let dir = tempdir().unwrap();
    let manager = StateManager::new(dir.path().join("state.json"));
    let mut checkpoint = Checkpoint::fresh();
    checkpoint.mark_completed(RecordType::Tasks);
    manager.store(checkpoint).await.unwrap();

    manager.clear().await.unwrap();
    assert_eq!(manager.checkpoint().await, Checkpoint::fresh());
}

#[tokio::test]
async fn test_to_json() {
    let manager = StateManager::in_memory();
    let json = manager.to_json().await.unwrap();
    let parsed: Checkpoint = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, Checkpoint::fresh());
}
