use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tokio_util::io::ReaderStream;
use uploader_core::{CompressedVideo, VIDEO_MP4};
use uploader_logging::{upload_debug, upload_info, upload_warn};

use crate::filename::upload_filename;
use crate::http::{build_streaming_client, endpoint, HttpSettings};
use crate::{RequestError, UploadConfig};

pub const DEV_KEY_HEADER: &str = "dev-key";

/// Body returned by `POST /upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadVideoResponse {
    pub job_id: String,
}

#[async_trait::async_trait]
pub trait Uploader: Send + Sync {
    /// Sends the compressed file for `did`. Called at most once per artifact.
    async fn upload(
        &self,
        video: &CompressedVideo,
        did: &str,
    ) -> Result<UploadVideoResponse, RequestError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestUploader {
    settings: HttpSettings,
    secret_header: String,
    filename_prefix: String,
    client: reqwest::Client,
}

impl ReqwestUploader {
    pub fn new(config: &UploadConfig) -> Result<Self, RequestError> {
        let settings = HttpSettings::from_config(config);
        let client = build_streaming_client(&settings)?;
        Ok(Self {
            settings,
            secret_header: config.upload_secret_header.clone(),
            filename_prefix: config.filename_prefix.clone(),
            client,
        })
    }
}

#[async_trait::async_trait]
impl Uploader for ReqwestUploader {
    async fn upload(
        &self,
        video: &CompressedVideo,
        did: &str,
    ) -> Result<UploadVideoResponse, RequestError> {
        let name = upload_filename(&self.filename_prefix);
        let url = endpoint(
            &self.settings.base_url,
            &["upload"],
            &[("did", did), ("name", name.as_str())],
        )?;

        let file = tokio::fs::File::open(&video.path).await?;
        let len = file.metadata().await?.len();
        upload_debug!("POST {} ({} bytes from {:?})", url, len, video.path);

        let activity = Arc::new(Notify::new());
        let progress = activity.clone();
        let stream = ReaderStream::new(file).inspect(move |_| progress.notify_one());
        let request = self
            .client
            .post(url)
            .header(DEV_KEY_HEADER, self.secret_header.as_str())
            .header(CONTENT_TYPE, VIDEO_MP4)
            .header(CONTENT_LENGTH, len.to_string())
            .body(reqwest::Body::wrap_stream(stream));

        let idle = self.settings.idle_timeout;
        let outcome = tokio::select! {
            result = exchange(request) => Some(result),
            _ = stalled(&activity, idle) => None,
        };
        let Some(result) = outcome else {
            upload_warn!("Upload {} made no progress for {:?}", name, idle);
            return Err(RequestError::Timeout);
        };
        let parsed = result?;
        upload_info!("Upload {} accepted as job {}", name, parsed.job_id);
        Ok(parsed)
    }
}

async fn exchange(request: reqwest::RequestBuilder) -> Result<UploadVideoResponse, RequestError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(RequestError::HttpStatus(status.as_u16()));
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Resolves once `activity` stays silent for `idle`.
async fn stalled(activity: &Notify, idle: Duration) {
    while tokio::time::timeout(idle, activity.notified()).await.is_ok() {}
}
