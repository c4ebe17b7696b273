//! State manager implementation
//!
//! Provides file-based checkpoint persistence with atomic writes.

use super::types::Checkpoint;
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Destination for checkpoint flushes made while a phase is running
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Persist a snapshot of the checkpoint
    async fn flush(&self, checkpoint: &Checkpoint) -> Result<()>;
}

/// State manager for persisting and loading the checkpoint
#[derive(Debug)]
pub struct StateManager {
    /// Path to the state file; empty in memory mode
    path: PathBuf,
    /// Current checkpoint (cached)
    state: Arc<RwLock<Checkpoint>>,
}

impl StateManager {
    /// Create a state manager backed by `path`. Nothing is read until
    /// [`StateManager::load`] is called.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Arc::new(RwLock::new(Checkpoint::fresh())),
        }
    }

    /// Create an in-memory state manager (no file persistence)
    pub fn in_memory() -> Self {
        Self::new(PathBuf::new())
    }

    /// Create a state manager from a file, loading existing state if present
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let checkpoint = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;
            parse(&contents)?
        } else {
            Checkpoint::fresh()
        };

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(checkpoint)),
        })
    }

    /// Create an in-memory state manager from inline JSON
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self {
            path: PathBuf::new(),
            state: Arc::new(RwLock::new(parse(json)?)),
        })
    }

    /// Load the checkpoint from file, keeping the current one if the file
    /// does not exist
    pub async fn load(&self) -> Result<()> {
        if self.is_in_memory() || !self.path.exists() {
            return Ok(());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;

        *self.state.write().await = parse(&contents)?;
        Ok(())
    }

    /// Save the current checkpoint to file
    pub async fn save(&self) -> Result<()> {
        if self.is_in_memory() {
            return Ok(());
        }

        let contents = self.to_json_pretty().await?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        debug!(path = %self.path.display(), "Checkpoint saved");
        Ok(())
    }

    /// Snapshot of the current checkpoint
    pub async fn checkpoint(&self) -> Checkpoint {
        self.state.read().await.clone()
    }

    /// Replace the current checkpoint without saving
    pub async fn replace(&self, checkpoint: Checkpoint) {
        *self.state.write().await = checkpoint;
    }

    /// Replace the current checkpoint and save it
    pub async fn store(&self, checkpoint: Checkpoint) -> Result<()> {
        self.replace(checkpoint).await;
        self.save().await
    }

    /// Export the checkpoint as JSON
    pub async fn to_json(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Export the checkpoint as pretty-printed JSON
    pub async fn to_json_pretty(&self) -> Result<String> {
        let state = self.state.read().await;
        serde_json::to_string_pretty(&*state)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))
    }

    /// Start over with a fresh checkpoint
    pub async fn clear(&self) -> Result<()> {
        self.store(Checkpoint::fresh()).await
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if using in-memory mode
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str().is_empty()
    }
}

impl Clone for StateManager {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

#[async_trait]
impl CheckpointStore for StateManager {
    async fn flush(&self, checkpoint: &Checkpoint) -> Result<()> {
        self.store(checkpoint.clone()).await
    }
}

fn parse(json: &str) -> Result<Checkpoint> {
    if json.trim().is_empty() {
        return Ok(Checkpoint::fresh());
    }
    serde_json::from_str(json).map_err(|e| Error::state(format!("Failed to parse state: {e}")))
}
