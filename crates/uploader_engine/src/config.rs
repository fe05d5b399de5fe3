use std::time::Duration;

use thiserror::Error;
use uploader_core::DEFAULT_MAX_VIDEO_BYTES;
use url::Url;

use crate::filename::is_valid_prefix;
use crate::poll::PollSettings;

pub const BASE_URL_ENV: &str = "VIDEO_UPLOAD_ROOT_ENDPOINT";
pub const SECRET_HEADER_ENV: &str = "VIDEO_UPLOAD_HEADER";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),
    #[error("invalid upload base url {value:?}: {reason}")]
    InvalidBaseUrl { value: String, reason: String },
    #[error("invalid filename prefix {0:?}: use 1-40 of A-Z a-z 0-9 _ -")]
    InvalidFilenamePrefix(String),
}

/// Upload service settings, validated once at construction.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub upload_base_url: Url,
    /// Sent as the `dev-key` header on uploads.
    pub upload_secret_header: String,
    pub filename_prefix: String,
    pub poll_interval: Duration,
    pub max_poll_failures: u32,
    pub connect_timeout: Duration,
    /// Deadline for a whole status request.
    pub request_timeout: Duration,
    /// An upload fails once no body bytes move and no response arrives for this long.
    pub upload_idle_timeout: Duration,
    pub max_video_bytes: u64,
}

impl UploadConfig {
    pub fn new(base_url: &str, secret_header: &str) -> Result<Self, ConfigError> {
        let base_url = base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Missing(BASE_URL_ENV));
        }
        let secret_header = secret_header.trim();
        if secret_header.is_empty() {
            return Err(ConfigError::Missing(SECRET_HEADER_ENV));
        }

        Ok(Self {
            upload_base_url: parse_base_url(base_url)?,
            upload_secret_header: secret_header.to_string(),
            filename_prefix: "video".to_string(),
            poll_interval: Duration::from_millis(1500),
            max_poll_failures: 3,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            upload_idle_timeout: Duration::from_secs(60),
            max_video_bytes: DEFAULT_MAX_VIDEO_BYTES,
        })
    }

    pub fn with_filename_prefix(mut self, prefix: &str) -> Result<Self, ConfigError> {
        if !is_valid_prefix(prefix) {
            return Err(ConfigError::InvalidFilenamePrefix(prefix.to_string()));
        }
        self.filename_prefix = prefix.to_string();
        Ok(self)
    }

    /// Reads [`BASE_URL_ENV`] and [`SECRET_HEADER_ENV`] from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let base_url = lookup(BASE_URL_ENV).ok_or(ConfigError::Missing(BASE_URL_ENV))?;
        let secret = lookup(SECRET_HEADER_ENV).ok_or(ConfigError::Missing(SECRET_HEADER_ENV))?;
        Self::new(&base_url, &secret)
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: self.poll_interval,
            max_consecutive_failures: self.max_poll_failures,
        }
    }
}

fn parse_base_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        value: value.to_string(),
        reason,
    };
    let url = Url::parse(value).map_err(|err| invalid(err.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme {other}"))),
    }
    if url.cannot_be_a_base() {
        return Err(invalid("url cannot be a base".to_string()));
    }
    Ok(url)
}
