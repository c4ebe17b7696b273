//! JSON lines writer
//!
//! Writes every item type to its own `{item_type}.jsonl` file under an
//! output directory, one item per line. Files are appended to, so a run
//! spread over several invocations accumulates into the same files.

use super::sink::ItemSink;
use crate::error::{Error, Result};
use crate::types::JsonValue;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Sink writing JSON lines files
#[derive(Debug)]
pub struct JsonLinesSink {
    dir: PathBuf,
    rows_written: BTreeMap<String, usize>,
}

impl JsonLinesSink {
    /// Create a sink writing into `dir`, creating it if needed
    pub fn new(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::output(format!(
                "Failed to create output directory {}: {e}",
                dir.display()
            ))
        })?;

        Ok(Self {
            dir,
            rows_written: BTreeMap::new(),
        })
    }

    /// Path of the file holding `item_type`
    pub fn path_for(&self, item_type: &str) -> PathBuf {
        let sanitized = item_type.replace(['/', '\\', '.'], "_");
        self.dir.join(format!("{sanitized}.jsonl"))
    }

    /// Rows written by this sink per item type
    pub fn rows_written(&self) -> &BTreeMap<String, usize> {
        &self.rows_written
    }

    /// Output directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ItemSink for JsonLinesSink {
    async fn push(&mut self, item_type: &str, items: Vec<JsonValue>) -> Result<()> {
        if items.is_empty() {
            return Ok(());
        }

        let mut buffer = Vec::new();
        for item in &items {
            serde_json::to_writer(&mut buffer, item)?;
            buffer.push(b'\n');
        }

        let path = self.path_for(item_type);
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| Error::output(format!("Failed to open {}: {e}", path.display())))?;

        file.write_all(&buffer)
            .await
            .map_err(|e| Error::output(format!("Failed to write {}: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| Error::output(format!("Failed to flush {}: {e}", path.display())))?;

        *self.rows_written.entry(item_type.to_string()).or_default() += items.len();
        Ok(())
    }
}
