use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identifies one `select_video` attempt within a session.
///
/// Every selection and every reset bumps the session's attempt, so results
/// tagged with an older attempt can be told apart and dropped.
pub type AttemptId = u64;

/// Opaque server-side job identifier.
pub type JobId = String;

/// Content type of every compressed artifact.
pub const VIDEO_MP4: &str = "video/mp4";

/// A media asset chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    pub path: PathBuf,
    pub size_bytes: Option<u64>,
    pub mime_type: Option<String>,
}

impl VideoAsset {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            size_bytes: None,
            mime_type: None,
        }
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// The artifact produced by a successful compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedVideo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub mime_type: String,
}

impl CompressedVideo {
    pub fn mp4(path: impl Into<PathBuf>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            size_bytes,
            mime_type: VIDEO_MP4.to_string(),
        }
    }
}

/// Remote processing state as reported by the job-status endpoint.
///
/// Only [`JobState::COMPLETED`] carries meaning here; every other value is
/// passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobState(String);

impl JobState {
    pub const COMPLETED: &'static str = "JOB_STATE_COMPLETED";

    pub fn new(state: impl Into<String>) -> Self {
        Self(state.into())
    }

    pub fn completed() -> Self {
        Self::new(Self::COMPLETED)
    }

    pub fn is_completed(&self) -> bool {
        self.0 == Self::COMPLETED
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for JobState {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for JobState {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Body of `GET /job/{id}/status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    pub state: JobState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Any fields the service adds beyond the ones above.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl JobStatus {
    pub fn new(state: impl Into<JobState>) -> Self {
        Self {
            job_id: None,
            did: None,
            state: state.into(),
            progress: None,
            error: None,
            message: None,
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_completed()
    }
}

/// Why a compression attempt did not produce an artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionFailure {
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Failed { reason: String },
}

/// Why an upload attempt did not produce a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub reason: String,
}

impl UploadFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
