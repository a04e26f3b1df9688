//! Core data model: uploaded artifacts, summary records, chat messages,
//! and engine configuration.

use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default ceiling on uploaded artifact size (10 MiB).
const DEFAULT_MAX_ARTIFACT_BYTES: u64 = 10 * 1024 * 1024;

/// Default ceiling on extracted text length (100KB).
const DEFAULT_MAX_EXTRACT_BYTES: usize = 100_000;

/// Default simulated reply delay range in milliseconds.
const DEFAULT_REPLY_DELAY_MS: (u64, u64) = (1000, 2000);

/// A user-uploaded file awaiting summarization.
///
/// Transient: consumed once by extraction, never persisted. `size_bytes` is
/// the declared upload size and is validated before any parsing; the media
/// type comes from the uploader and may not match the actual content.
#[derive(Debug, Clone)]
pub struct UploadedArtifact {
    pub name: String,
    pub size_bytes: u64,
    pub media_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedArtifact {
    /// Build an artifact from in-memory bytes. Size is derived from the
    /// payload.
    pub fn new(name: impl Into<String>, media_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size_bytes: bytes.len() as u64,
            media_type,
            bytes,
        }
    }

    /// Read an artifact from disk, guessing the media type from the
    /// file extension.
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let media_type = guess_media_type(path);
        Ok(Self::new(name, media_type, bytes))
    }
}

fn guess_media_type(path: &Path) -> Option<String> {
    let ext = path.extension().and_then(|e| e.to_str())?.to_lowercase();
    let media = match ext.as_str() {
        "pdf" => "application/pdf",
        "txt" | "log" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "csv" => "text/csv",
        _ => return None,
    };
    Some(media.to_string())
}

/// A generated summary, owned by the history store once appended.
///
/// `created_at` serializes as an ISO-8601 timestamp. The camelCase field
/// names are the persisted interchange format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRecord {
    pub id: String,
    pub title: String,
    pub file_name: String,
    pub created_at: DateTime<Utc>,
    pub content: String,
    pub key_points: Vec<String>,
    pub word_count: usize,
}

/// The fields produced by synthesis, before the store assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDraft {
    pub title: String,
    pub file_name: String,
    pub content: String,
    pub key_points: Vec<String>,
    pub word_count: usize,
    /// Assigned by the store at append time when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// One message in an open summary's chat transcript.
///
/// Transient: scoped to a single open-summary session and cleared when a
/// different summary is opened or a new upload starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
}

/// Engine tuning knobs with serde defaults, so collaborators can load a
/// partial config file and get sensible values for the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Uploads larger than this are rejected before parsing.
    #[serde(default = "default_max_artifact_bytes")]
    pub max_artifact_bytes: u64,
    /// Extracted text is truncated to this many bytes.
    #[serde(default = "default_max_extract_bytes")]
    pub max_extract_bytes: usize,
    /// Inclusive (min, max) range for the simulated reply delay.
    #[serde(default = "default_reply_delay_ms")]
    pub reply_delay_ms: (u64, u64),
}

fn default_max_artifact_bytes() -> u64 {
    DEFAULT_MAX_ARTIFACT_BYTES
}

fn default_max_extract_bytes() -> usize {
    DEFAULT_MAX_EXTRACT_BYTES
}

fn default_reply_delay_ms() -> (u64, u64) {
    DEFAULT_REPLY_DELAY_MS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_artifact_bytes: DEFAULT_MAX_ARTIFACT_BYTES,
            max_extract_bytes: DEFAULT_MAX_EXTRACT_BYTES,
            reply_delay_ms: DEFAULT_REPLY_DELAY_MS,
        }
    }
}
