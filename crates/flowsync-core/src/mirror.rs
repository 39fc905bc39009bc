//! Local filesystem mirror of flow documents.
//!
//! Mirror files carry the remote payload envelope, so the document's own
//! declared `gmt_modified` travels with it:
//!
//! ```json
//! {
//!   "name": "support",
//!   "gmt_modified": "2024-05-01 12:00:00",
//!   "flow_settings": { ... }
//! }
//! ```
//!
//! The Puller writes `input/<name>.json`; people and tools edit
//! `output/<name>.json`. Staleness is always judged on the declared
//! `gmt_modified` field, never on filesystem mtime: the mirroring step
//! itself rewrites mtime, which would falsely look "newer".

use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use flowsync_types::models::{format_gmt_modified, parse_gmt_modified};
use flowsync_types::FlowDocument;

use crate::error::{SyncError, SyncResult};
use crate::gateway::RemoteFlow;

/// On-disk envelope for one flow document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MirrorDocument {
    /// Bot display name.
    pub name: String,
    /// Declared modification timestamp, `YYYY-MM-DD HH:MM:SS` (UTC).
    pub gmt_modified: String,
    /// The flow settings document.
    pub flow_settings: serde_json::Value,
}

impl MirrorDocument {
    /// Envelope for a freshly fetched remote flow.
    pub fn from_remote(remote: &RemoteFlow) -> Self {
        Self {
            name: remote.name.clone(),
            gmt_modified: format_gmt_modified(remote.modified_at),
            flow_settings: remote.settings.clone(),
        }
    }

    /// The exact bytes the mirror stores for this envelope.
    pub fn to_bytes(&self) -> SyncResult<Bytes> {
        let mut buf = serde_json::to_vec_pretty(self)?;
        buf.push(b'\n');
        Ok(Bytes::from(buf))
    }
}

/// Reads and writes mirror files under the input/output directories.
pub struct LocalMirror {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl LocalMirror {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Create both mirror directories if missing.
    pub async fn ensure_dirs(&self) -> SyncResult<()> {
        tokio::fs::create_dir_all(&self.input_dir).await?;
        tokio::fs::create_dir_all(&self.output_dir).await?;
        Ok(())
    }

    /// Directory the Pusher watches.
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn input_path(&self, display_name: &str) -> PathBuf {
        self.input_dir.join(format!("{display_name}.json"))
    }

    fn output_path(&self, display_name: &str) -> PathBuf {
        self.output_dir.join(format!("{display_name}.json"))
    }

    /// Write document bytes to the input path for an entity.
    ///
    /// Atomic: writes a temp file then renames over the target, so readers
    /// never observe a half-written document.
    pub async fn write_input(&self, display_name: &str, content: &[u8]) -> SyncResult<()> {
        let target = self.input_path(display_name);
        let temp = self.input_dir.join(format!("{display_name}.json.tmp"));
        tokio::fs::write(&temp, content).await?;
        tokio::fs::rename(&temp, &target).await?;
        Ok(())
    }

    /// Read the current output document for an entity.
    ///
    /// Returns the candidate document (raw bytes, declared timestamp) plus
    /// the parsed flow settings for a subsequent push.
    pub async fn read_output(
        &self,
        entity_id: &str,
        display_name: &str,
    ) -> SyncResult<(FlowDocument, serde_json::Value)> {
        let path = self.output_path(display_name);
        let raw = tokio::fs::read(&path).await?;

        let envelope: MirrorDocument = serde_json::from_slice(&raw)?;
        let modified_at =
            parse_gmt_modified(&envelope.gmt_modified).map_err(|e| SyncError::Parse {
                entity_id: entity_id.to_string(),
                message: format!("bad gmt_modified {:?}: {}", envelope.gmt_modified, e),
            })?;

        let doc = FlowDocument::new(entity_id, Bytes::from(raw), modified_at);
        Ok((doc, envelope.flow_settings))
    }
}
