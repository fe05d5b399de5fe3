use thiserror::Error;
use uploader_core::{CompressionFailure, JobStatus};

/// Events reported by running invokers.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Compression progress, a fraction in `[0, 1]`.
    CompressionProgress(f64),
    /// A status response, terminal or not.
    JobStatus(JobStatus),
    /// The poller stopped after too many consecutive request failures.
    PollFailed(RequestError),
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompressError {
    #[error("compressed video is too large (max {max_bytes}, actual {actual})")]
    TooLarge { max_bytes: u64, actual: u64 },
    #[error("compression failed: {0}")]
    Failed(String),
    #[error("compression cancelled")]
    Cancelled,
}

impl CompressError {
    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub fn to_failure(&self) -> CompressionFailure {
        match self {
            CompressError::TooLarge { max_bytes, actual } => CompressionFailure::TooLarge {
                max_bytes: *max_bytes,
                actual: Some(*actual),
            },
            other => CompressionFailure::Failed {
                reason: other.to_string(),
            },
        }
    }
}

/// Failure of an HTTP exchange with the upload service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("timeout")]
    Timeout,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("invalid response body: {0}")]
    InvalidResponse(String),
}

impl From<std::io::Error> for RequestError {
    fn from(err: std::io::Error) -> Self {
        RequestError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for RequestError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return RequestError::Timeout;
        }
        RequestError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        RequestError::InvalidResponse(err.to_string())
    }
}
